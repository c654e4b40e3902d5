//! The closed set of worker identities known to the orchestrator.

use serde::{Deserialize, Serialize};

/// Identity of a worker that can own a step.
///
/// Dispatch is matched exhaustively over this enum, so adding a worker kind
/// forces every routing site to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    /// The end user; steps assigned here complete once feedback is recorded
    #[serde(rename = "Human_Agent")]
    Human,
    /// Human-resources specialist
    #[serde(rename = "Hr_Agent")]
    Hr,
    /// Marketing specialist
    #[serde(rename = "Marketing_Agent")]
    Marketing,
    /// Product specialist
    #[serde(rename = "Product_Agent")]
    Product,
    /// Procurement specialist
    #[serde(rename = "Procurement_Agent")]
    Procurement,
    /// Technical-support specialist
    #[serde(rename = "Tech_Support_Agent")]
    TechSupport,
    /// Fallback worker for actions no specialist covers
    #[serde(rename = "Generic_Agent")]
    Generic,
    /// Decomposes a goal into a plan of steps
    #[serde(rename = "Planner_Agent")]
    Planner,
    /// Owns step dispatch and plan completion
    #[serde(rename = "Coordinator_Agent")]
    Coordinator,
}

impl AgentKind {
    /// Every worker identity, in registry construction order.
    pub const ALL: [AgentKind; 9] = [
        AgentKind::Hr,
        AgentKind::Marketing,
        AgentKind::Product,
        AgentKind::Procurement,
        AgentKind::TechSupport,
        AgentKind::Generic,
        AgentKind::Human,
        AgentKind::Planner,
        AgentKind::Coordinator,
    ];

    /// The identities a planner may assign steps to.
    pub const ASSIGNABLE: [AgentKind; 7] = [
        AgentKind::Human,
        AgentKind::Hr,
        AgentKind::Marketing,
        AgentKind::Product,
        AgentKind::Procurement,
        AgentKind::TechSupport,
        AgentKind::Generic,
    ];

    /// Canonical wire name, e.g. `Tech_Support_Agent`.
    pub fn name(self) -> &'static str {
        match self {
            AgentKind::Human => "Human_Agent",
            AgentKind::Hr => "Hr_Agent",
            AgentKind::Marketing => "Marketing_Agent",
            AgentKind::Product => "Product_Agent",
            AgentKind::Procurement => "Procurement_Agent",
            AgentKind::TechSupport => "Tech_Support_Agent",
            AgentKind::Generic => "Generic_Agent",
            AgentKind::Planner => "Planner_Agent",
            AgentKind::Coordinator => "Coordinator_Agent",
        }
    }

    /// Human-readable name with underscores rendered as spaces,
    /// e.g. `Tech Support Agent`.
    pub fn display_name(self) -> String {
        self.name().replace('_', " ")
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Human_Agent" => Ok(AgentKind::Human),
            "Hr_Agent" => Ok(AgentKind::Hr),
            "Marketing_Agent" => Ok(AgentKind::Marketing),
            "Product_Agent" => Ok(AgentKind::Product),
            "Procurement_Agent" => Ok(AgentKind::Procurement),
            "Tech_Support_Agent" => Ok(AgentKind::TechSupport),
            "Generic_Agent" => Ok(AgentKind::Generic),
            "Planner_Agent" => Ok(AgentKind::Planner),
            "Coordinator_Agent" => Ok(AgentKind::Coordinator),
            other => Err(format!("unknown agent kind: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_name_round_trip() {
        for kind in AgentKind::ALL {
            assert_eq!(AgentKind::from_str(kind.name()), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        assert!(AgentKind::from_str("Finance_Agent").is_err());
        assert!(AgentKind::from_str("").is_err());
    }

    #[test]
    fn test_display_name_replaces_underscores() {
        assert_eq!(AgentKind::TechSupport.display_name(), "Tech Support Agent");
        assert_eq!(AgentKind::Hr.display_name(), "Hr Agent");
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&AgentKind::TechSupport).unwrap();
        assert_eq!(json, "\"Tech_Support_Agent\"");
        let kind: AgentKind = serde_json::from_str("\"Planner_Agent\"").unwrap();
        assert_eq!(kind, AgentKind::Planner);
    }

    #[test]
    fn test_assignable_excludes_orchestration_roles() {
        assert!(!AgentKind::ASSIGNABLE.contains(&AgentKind::Planner));
        assert!(!AgentKind::ASSIGNABLE.contains(&AgentKind::Coordinator));
        assert!(AgentKind::ASSIGNABLE.contains(&AgentKind::Human));
    }
}
