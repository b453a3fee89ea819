use serde::{Deserialize, Serialize};

/// Service name with optional Welsh translation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceName {
    pub en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cy: Option<String>,
}

/// A service as embedded in the user's service roles by adminusers.
///
/// A service groups one or more gateway accounts (usually one test and one
/// live account).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub external_id: String,
    pub name: String,
    #[serde(default)]
    pub service_name: Option<ServiceName>,
    #[serde(default)]
    pub gateway_account_ids: Vec<String>,
    #[serde(default)]
    pub current_go_live_stage: Option<String>,
}

impl Service {
    pub fn has_gateway_account(&self, gateway_account_id: i64) -> bool {
        let id = gateway_account_id.to_string();
        self.gateway_account_ids.iter().any(|g| *g == id)
    }

    /// Welsh name when one is set, otherwise the English name.
    pub fn display_name(&self, welsh: bool) -> &str {
        match &self.service_name {
            Some(ServiceName { cy: Some(cy), .. }) if welsh && !cy.is_empty() => cy,
            Some(ServiceName { en, .. }) if !en.is_empty() => en,
            _ => &self.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> Service {
        Service {
            external_id: "svc-1".into(),
            name: "System Generated".into(),
            service_name: Some(ServiceName {
                en: "Apply for a licence".into(),
                cy: Some("Gwneud cais am drwydded".into()),
            }),
            gateway_account_ids: vec!["1".into(), "42".into()],
            current_go_live_stage: None,
        }
    }

    #[test]
    fn test_has_gateway_account_matches_string_ids() {
        let s = service();
        assert!(s.has_gateway_account(42));
        assert!(!s.has_gateway_account(4));
    }

    #[test]
    fn test_display_name_prefers_welsh_when_asked() {
        let s = service();
        assert_eq!(s.display_name(true), "Gwneud cais am drwydded");
        assert_eq!(s.display_name(false), "Apply for a licence");
    }

    #[test]
    fn test_display_name_falls_back_to_name() {
        let mut s = service();
        s.service_name = None;
        assert_eq!(s.display_name(true), "System Generated");
    }
}
