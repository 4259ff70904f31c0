//! The ordered list of installation stages and their progress weights.

use serde::{Deserialize, Serialize};

/// Python libraries installed by the library stage, in order.
pub const PYTHON_LIBRARIES: &[&str] = &[
    "numpy",
    "pandas",
    "matplotlib",
    "requests",
    "flask",
    "pytest",
];

/// VS Code extensions installed by the extension stage, in order.
pub const EDITOR_EXTENSIONS: &[&str] = &[
    "ms-python.python",
    "ms-python.vscode-pylance",
    "ms-toolsai.jupyter",
    "formulahendry.code-runner",
    "esbenp.prettier-vscode",
];

pub const RUNTIME_WEIGHT: u32 = 25;
pub const EDITOR_WEIGHT: u32 = 25;
pub const LIBRARIES_WEIGHT: u32 = 30;
pub const EXTENSIONS_WEIGHT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageKind {
    Runtime,
    Editor,
    Libraries,
    Extensions,
}

impl StageKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Runtime => "Install Python",
            Self::Editor => "Install VS Code",
            Self::Libraries => "Install Python libraries",
            Self::Extensions => "Install VS Code extensions",
        }
    }

    /// Optional stages can be switched off per run.
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Libraries | Self::Extensions)
    }
}

/// What a stage does. Set variants own their item lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageAction {
    DetectAndInstallRuntime,
    DetectAndInstallEditor,
    InstallLibrarySet(Vec<String>),
    InstallExtensionSet(Vec<String>),
}

impl StageAction {
    pub fn kind(&self) -> StageKind {
        match self {
            Self::DetectAndInstallRuntime => StageKind::Runtime,
            Self::DetectAndInstallEditor => StageKind::Editor,
            Self::InstallLibrarySet(_) => StageKind::Libraries,
            Self::InstallExtensionSet(_) => StageKind::Extensions,
        }
    }
}

/// One named unit of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: &'static str,
    /// Progress ticks this stage consumes.
    pub weight: u32,
    pub action: StageAction,
    pub enabled: bool,
}

impl Stage {
    fn new(action: StageAction, weight: u32) -> Self {
        Self {
            name: action.kind().label(),
            weight,
            action,
            enabled: true,
        }
    }

    pub fn runtime() -> Self {
        Self::new(StageAction::DetectAndInstallRuntime, RUNTIME_WEIGHT)
    }

    pub fn editor() -> Self {
        Self::new(StageAction::DetectAndInstallEditor, EDITOR_WEIGHT)
    }

    pub fn libraries<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = items.into_iter().map(Into::into).collect();
        Self::new(StageAction::InstallLibrarySet(items), LIBRARIES_WEIGHT)
    }

    pub fn extensions<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = items.into_iter().map(Into::into).collect();
        Self::new(StageAction::InstallExtensionSet(items), EXTENSIONS_WEIGHT)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn kind(&self) -> StageKind {
        self.action.kind()
    }
}

/// Ordered installation stages.
///
/// # Example
///
/// ```rust
/// use setgo::InstallationPlan;
///
/// let plan = InstallationPlan::standard();
/// assert_eq!(plan.total_weight(), 100);
/// assert_eq!(plan.stages().len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationPlan {
    stages: Vec<Stage>,
}

impl InstallationPlan {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// Python, VS Code, the fixed library set and the fixed extension set.
    pub fn standard() -> Self {
        Self::new(vec![
            Stage::runtime(),
            Stage::editor(),
            Stage::libraries(PYTHON_LIBRARIES.iter().copied()),
            Stage::extensions(EDITOR_EXTENSIONS.iter().copied()),
        ])
    }

    /// Apply per-run switches for the optional stages. Mandatory stages are
    /// left as they are.
    pub fn with_optional(mut self, install_libraries: bool, install_extensions: bool) -> Self {
        for stage in &mut self.stages {
            match stage.kind() {
                StageKind::Libraries => stage.enabled &= install_libraries,
                StageKind::Extensions => stage.enabled &= install_extensions,
                StageKind::Runtime | StageKind::Editor => {}
            }
        }
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn enabled_stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().filter(|stage| stage.enabled)
    }

    /// Sum of the enabled stages' weights: the tracker's step budget.
    pub fn total_weight(&self) -> u32 {
        self.enabled_stages().map(|stage| stage.weight).sum()
    }
}

/// Split `weight` ticks over `count` items.
///
/// Shares differ by at most one and always sum to `weight`, so a set stage
/// lands exactly on its ceiling.
///
/// ```rust
/// use setgo::distribute;
///
/// assert_eq!(distribute(30, 4), vec![7, 8, 7, 8]);
/// assert_eq!(distribute(20, 6).iter().sum::<u32>(), 20);
/// ```
pub fn distribute(weight: u32, count: usize) -> Vec<u32> {
    let Ok(count) = u32::try_from(count) else {
        return Vec::new();
    };
    (0..count)
        .map(|i| {
            let start = u64::from(weight) * u64::from(i) / u64::from(count);
            let end = u64::from(weight) * u64::from(i + 1) / u64::from(count);
            (end - start) as u32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_plan_order_and_weights() {
        let plan = InstallationPlan::standard();
        let kinds: Vec<_> = plan.stages().iter().map(Stage::kind).collect();
        assert_eq!(
            kinds,
            vec![
                StageKind::Runtime,
                StageKind::Editor,
                StageKind::Libraries,
                StageKind::Extensions
            ]
        );
        assert_eq!(plan.total_weight(), 100);
    }

    #[test]
    fn test_standard_item_lists() {
        let plan = InstallationPlan::standard();
        let StageAction::InstallLibrarySet(libraries) = &plan.stages()[2].action else {
            panic!("third stage should install libraries");
        };
        assert_eq!(libraries.first().map(String::as_str), Some("numpy"));
        assert_eq!(libraries.len(), 6);

        let StageAction::InstallExtensionSet(extensions) = &plan.stages()[3].action else {
            panic!("fourth stage should install extensions");
        };
        assert_eq!(extensions.len(), 5);
    }

    #[test]
    fn test_optional_stages_drop_out_of_budget() {
        let plan = InstallationPlan::standard().with_optional(false, false);
        assert_eq!(plan.total_weight(), RUNTIME_WEIGHT + EDITOR_WEIGHT);
        assert_eq!(plan.enabled_stages().count(), 2);

        let plan = InstallationPlan::standard().with_optional(true, false);
        assert_eq!(
            plan.total_weight(),
            RUNTIME_WEIGHT + EDITOR_WEIGHT + LIBRARIES_WEIGHT
        );
    }

    #[test]
    fn test_optional_switch_does_not_reenable() {
        let plan = InstallationPlan::new(vec![Stage::libraries(["a"]).with_enabled(false)])
            .with_optional(true, true);
        assert_eq!(plan.enabled_stages().count(), 0);
    }

    #[test]
    fn test_mandatory_stages_ignore_switches() {
        let plan = InstallationPlan::new(vec![Stage::runtime(), Stage::editor()])
            .with_optional(false, false);
        assert_eq!(plan.enabled_stages().count(), 2);
    }

    #[test]
    fn test_distribute_sums_to_weight() {
        for weight in 0..=40 {
            for count in 1..=9 {
                let shares = distribute(weight, count);
                assert_eq!(shares.len(), count);
                assert_eq!(shares.iter().sum::<u32>(), weight);
                let max = *shares.iter().max().unwrap();
                let min = *shares.iter().min().unwrap();
                assert!(max - min <= 1);
            }
        }
    }

    #[test]
    fn test_distribute_no_items() {
        assert!(distribute(30, 0).is_empty());
    }

    #[test]
    fn test_optional_kinds() {
        assert!(!StageKind::Runtime.is_optional());
        assert!(StageKind::Extensions.is_optional());
    }
}
