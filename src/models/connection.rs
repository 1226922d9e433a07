use serde::{Deserialize, Serialize};

/// Database backends the server knows how to connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    #[serde(rename = "mongodb")]
    MongoDb,
    #[serde(rename = "mysql")]
    MySql,
}

impl DbType {
    /// Display label for the UI.
    pub fn label(&self) -> &'static str {
        match self {
            DbType::MongoDb => "MongoDB",
            DbType::MySql => "MySQL",
        }
    }

    /// Cycle to the other backend (the connect and query forms toggle
    /// between the two).
    pub fn toggle(&self) -> Self {
        match self {
            DbType::MongoDb => DbType::MySql,
            DbType::MySql => DbType::MongoDb,
        }
    }

    /// Conventional default port, used to prefill the connect form.
    pub fn default_port(&self) -> &'static str {
        match self {
            DbType::MongoDb => "27017",
            DbType::MySql => "3306",
        }
    }
}

/// Connection form state, sent once to `/database/connect` and never
/// persisted locally. The port travels as a string because that is what
/// the form collects and what the server accepts.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionDetails {
    pub host: String,
    pub port: String,
    pub username: String,
    pub password: String,
    pub database: String,
    pub db_type: DbType,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub available_collections: Vec<String>,
    #[serde(default)]
    pub connection_id: Option<String>,
}

/// A saved connection record as reported by the server. The shape is
/// loose; every field is optional and unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionDescriptor {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub db_type: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ConnectionDescriptor {
    /// "host/database" display string for the connections table.
    pub fn display_target(&self) -> String {
        match (self.host.as_deref(), self.database.as_deref()) {
            (Some(host), Some(db)) => format!("{}/{}", host, db),
            (Some(host), None) => host.to_string(),
            (None, Some(db)) => db.to_string(),
            (None, None) => "-".to_string(),
        }
    }

    pub fn display_db_type(&self) -> String {
        self.db_type.clone().unwrap_or_else(|| "unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_type_wire_format() {
        assert_eq!(serde_json::to_string(&DbType::MongoDb).unwrap(), "\"mongodb\"");
        assert_eq!(serde_json::to_string(&DbType::MySql).unwrap(), "\"mysql\"");
    }

    #[test]
    fn test_db_type_toggle() {
        assert_eq!(DbType::MongoDb.toggle(), DbType::MySql);
        assert_eq!(DbType::MySql.toggle(), DbType::MongoDb);
    }

    #[test]
    fn test_connection_details_payload() {
        let details = ConnectionDetails {
            host: "localhost".to_string(),
            port: "27017".to_string(),
            username: String::new(),
            password: String::new(),
            database: "test".to_string(),
            db_type: DbType::MongoDb,
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["host"], "localhost");
        assert_eq!(json["port"], "27017");
        assert_eq!(json["db_type"], "mongodb");
    }

    #[test]
    fn test_connect_response_parses_backend_shape() {
        let json = r#"{
            "message": "Connected successfully",
            "available_collections": ["users", "orders"],
            "connection_id": "66f1a2"
        }"#;
        let resp: ConnectResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.available_collections, vec!["users", "orders"]);
        assert_eq!(resp.connection_id.as_deref(), Some("66f1a2"));
    }

    #[test]
    fn test_descriptor_display_target() {
        let mut desc = ConnectionDescriptor::default();
        assert_eq!(desc.display_target(), "-");
        desc.host = Some("db.internal".to_string());
        assert_eq!(desc.display_target(), "db.internal");
        desc.database = Some("sales".to_string());
        assert_eq!(desc.display_target(), "db.internal/sales");
    }
}
