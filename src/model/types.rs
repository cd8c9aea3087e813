//! Classification enums for Event Horizon entities
//!
//! Every enum serializes to the exact human-readable string used on the wire
//! (e.g. `"Planning Phase"`, `"Not started"`, `"Weekly-Milestone"`), and can be
//! parsed back from that string with [`std::str::FromStr`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ModelError;

/// Declares a wire enum with `as_str`, `all`, `Display` and `FromStr`.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Wire representation of this value
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $wire, )+
                }
            }

            /// All values in declaration order
            pub fn all() -> &'static [$name] {
                &[$( Self::$variant, )+]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                Self::all()
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| ModelError::UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                        expected: Self::all()
                            .iter()
                            .map(|v| v.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }
    };
}

wire_enum! {
    /// Lifecycle status of a project
    ProjectStatus, "project status" {
        PlanningPhase => "Planning Phase",
        Active => "Active",
        Completed => "Completed",
        Cancelled => "Cancelled",
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::PlanningPhase
    }
}

wire_enum! {
    /// Status shared by goals and tasks
    WorkStatus, "status" {
        NotStarted => "Not started",
        Active => "Active",
        Done => "Done",
        Cancelled => "Cancelled",
    }
}

impl Default for WorkStatus {
    fn default() -> Self {
        WorkStatus::NotStarted
    }
}

impl WorkStatus {
    /// Whether this status counts as completed in progress views
    pub fn is_done(self) -> bool {
        self == WorkStatus::Done
    }
}

/// Status of a goal
pub type GoalStatus = WorkStatus;

/// Status of a task
pub type TaskStatus = WorkStatus;

wire_enum! {
    /// Granularity tag of a goal
    GoalScope, "goal scope" {
        Monthly => "Monthly",
        Quarterly => "Quarterly",
        /// Requires a Monthly or Quarterly parent goal
        WeeklyMilestone => "Weekly-Milestone",
    }
}

impl GoalScope {
    /// Whether a goal with this scope may be the parent of another goal
    pub fn can_parent(self) -> bool {
        matches!(self, GoalScope::Monthly | GoalScope::Quarterly)
    }

    /// Whether a goal with this scope must have a parent goal
    pub fn requires_parent(self) -> bool {
        self == GoalScope::WeeklyMilestone
    }
}

wire_enum! {
    /// Kind of work a task represents
    TaskType, "task type" {
        Network => "Network",
        Debug => "Debug",
        Review => "Review",
        Develop => "Develop",
        Marketing => "Marketing",
        Provision => "Provision",
        Research => "Research",
    }
}

wire_enum! {
    /// Task priority
    Priority, "priority" {
        Low => "Low",
        Medium => "Medium",
        High => "High",
    }
}

wire_enum! {
    /// Coarse task sizing
    EffortLevel, "effort level" {
        Small => "Small",
        Medium => "Medium",
        Large => "Large",
    }
}

wire_enum! {
    /// Planning horizon for project expansion
    ExpansionHorizon, "expansion horizon" {
        OneWeek => "1 Week",
        TwoWeeks => "2 Weeks",
        ThreeWeeks => "3 Weeks",
    }
}

wire_enum! {
    /// Milestone granularity of a project plan
    MilestoneGranularity, "milestone granularity" {
        Monthly => "Monthly",
        Quarterly => "Quarterly",
        MonthlyAndQuarterly => "Monthly&Quarterly",
    }
}

wire_enum! {
    /// Entity kinds a knowledge base document can reference
    EntityKind, "entity type" {
        Project => "project",
        Goal => "goal",
        Task => "task",
    }
}
