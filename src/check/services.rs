//! Built-in GeoIP service list and loading of custom lists

use crate::check::models::ServiceDescriptor;
use crate::error::{CheckError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Layout of a services TOML file
#[derive(Debug, Deserialize)]
struct ServicesFile {
    #[serde(default)]
    services: Vec<ServiceDescriptor>,
}

pub struct ServiceCatalog;

impl ServiceCatalog {
    /// The endpoints queried when no services file is given
    pub fn builtin() -> Vec<ServiceDescriptor> {
        vec![
            ServiceDescriptor::json(
                "ip-api",
                "http://ip-api.com/json/?fields=countryCode",
                "countryCode",
            ),
            ServiceDescriptor::json("ipinfo", "https://ipinfo.io/json", "country"),
            ServiceDescriptor::trace("Cloudflare", "https://www.cloudflare.com/cdn-cgi/trace"),
            ServiceDescriptor::json("ip.sb", "https://api.ip.sb/geoip", "country_code"),
            ServiceDescriptor::json(
                "ipregistry",
                "https://api.ipregistry.co/?key=tryout",
                "location.country.code",
            ),
            ServiceDescriptor::json(
                "extreme-ip-lookup",
                "https://extreme-ip-lookup.com/json/",
                "countryCode",
            ),
            ServiceDescriptor::json("ipapi.co", "https://ipapi.co/json/", "country_code"),
            ServiceDescriptor::json(
                "coo.su",
                "http://coo.su/api/ip.php?json=1",
                "country_code",
            ),
            ServiceDescriptor::json("ipwhois", "https://ipwho.is/", "country_code"),
            ServiceDescriptor::json("ifconfig.co", "https://ifconfig.co/json", "country_iso"),
            ServiceDescriptor::json(
                "ifconfig.me",
                "https://ifconfig.me/all.json",
                "country_code",
            ),
        ]
    }

    /// Parse a services list from TOML text
    pub fn parse(content: &str) -> Result<Vec<ServiceDescriptor>> {
        let file: ServicesFile = toml::from_str(content)
            .map_err(|e| CheckError::config(format!("Invalid services file: {e}")))?;

        if file.services.is_empty() {
            return Err(CheckError::config("Services file defines no services"));
        }

        for service in &file.services {
            if service.name.trim().is_empty() {
                return Err(CheckError::config("Service with empty name"));
            }
            if !service.url.starts_with("http://") && !service.url.starts_with("https://") {
                return Err(CheckError::config(format!(
                    "Service '{}' has a non-HTTP URL: {}",
                    service.name, service.url
                )));
            }
        }

        Ok(file.services)
    }

    /// Load a services list from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<ServiceDescriptor>> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_services() {
        let services = ServiceCatalog::builtin();
        assert_eq!(services.len(), 11);
        for service in &services {
            assert!(!service.name.is_empty());
            assert!(service.url.starts_with("http"));
        }
        assert_eq!(
            services.iter().filter(|s| s.path.is_none()).count(),
            1,
            "only the trace endpoint uses the text parser"
        );
    }

    #[test]
    fn test_parse_services_file() {
        let content = r#"
[[services]]
name = "ipinfo"
url = "https://ipinfo.io/json"
path = "country"

[[services]]
name = "trace"
url = "https://one.one.one.one/cdn-cgi/trace"
"#;
        let services = ServiceCatalog::parse(content).unwrap();
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].path.as_deref(), Some("country"));
        assert!(services[1].path.is_none());
    }

    #[test]
    fn test_parse_rejects_empty_and_invalid() {
        assert!(ServiceCatalog::parse("").is_err());
        assert!(ServiceCatalog::parse("services = []").is_err());
        assert!(ServiceCatalog::parse("[[services]]\nname = \"x\"").is_err());

        let bad_url = "[[services]]\nname = \"x\"\nurl = \"ftp://example.com\"";
        assert!(matches!(
            ServiceCatalog::parse(bad_url),
            Err(CheckError::Config { .. })
        ));
    }

    #[test]
    fn test_load_services_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[[services]]\nname = \"ip-api\"\nurl = \"http://ip-api.com/json/\"\npath = \"countryCode\""
        )
        .unwrap();

        let services = ServiceCatalog::load(file.path()).unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "ip-api");
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            ServiceCatalog::load("/nonexistent/services.toml"),
            Err(CheckError::Io(_))
        ));
    }
}
