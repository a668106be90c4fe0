//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use confab_core::error::{GatewayError, Result};

pub use schema::{DatabaseConfig, ExportConfig, GatewayConfig, GatewaySection, LlmConfig};

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| GatewayError::Fatal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| GatewayError::Validation(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deny_unknown_fields_nested() {
        let bad = r#"
version: 1
gateway:
  listen: "0.0.0.0:8080"
database:
  url: "postgres://localhost/confab"
  max_connectionz: 5
"#;
        let err = load_from_str(bad).expect_err("must fail");
        assert_eq!(err.client_code().as_str(), "VALIDATION");
    }

    #[test]
    fn ok_minimal_config() {
        let ok = r#"
version: 1
database:
  url: "postgres://localhost/confab"
"#;
        let cfg = load_from_str(ok).expect("must parse");
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.gateway.listen, "0.0.0.0:8080");
        assert_eq!(cfg.export.retention_hours, 24);
    }

    #[test]
    fn rejects_unsupported_version() {
        let bad = r#"
version: 2
database:
  url: "postgres://localhost/confab"
"#;
        assert!(load_from_str(bad).is_err());
    }
}
