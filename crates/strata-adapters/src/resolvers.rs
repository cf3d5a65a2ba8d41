//! Non-interactive conflict resolvers.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use strata_core::{
    application::{ConflictResolver, ResolverError},
    domain::{ConflictSolveResult, ConflictSolverData},
};

/// What to do with every conflict block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolverStrategy {
    /// Take the later layer's lines.
    KeepCurrent,
    /// Take the earlier layer's lines.
    KeepFormer,
    /// Keep markers in the file but do not report the path as conflicted.
    IgnoreAll,
    /// Keep markers and report the path.
    #[default]
    LeaveUnresolved,
}

impl ResolverStrategy {
    pub const ALL: [Self; 4] = [
        Self::KeepCurrent,
        Self::KeepFormer,
        Self::IgnoreAll,
        Self::LeaveUnresolved,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::KeepCurrent => "keep-current",
            Self::KeepFormer => "keep-former",
            Self::IgnoreAll => "ignore-all",
            Self::LeaveUnresolved => "leave-unresolved",
        }
    }
}

impl fmt::Display for ResolverStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolverStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keep-current" | "current" | "theirs" => Ok(Self::KeepCurrent),
            "keep-former" | "former" | "ours" => Ok(Self::KeepFormer),
            "ignore-all" | "ignore" => Ok(Self::IgnoreAll),
            "leave-unresolved" | "leave" | "none" => Ok(Self::LeaveUnresolved),
            other => Err(format!(
                "unknown conflict strategy '{other}' (expected one of: {})",
                Self::ALL.map(|s| s.as_str()).join(", ")
            )),
        }
    }
}

/// Applies one [`ResolverStrategy`] to every conflict.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyResolver {
    strategy: ResolverStrategy,
}

impl StrategyResolver {
    pub fn new(strategy: ResolverStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> ResolverStrategy {
        self.strategy
    }
}

impl ConflictResolver for StrategyResolver {
    fn resolve(&self, data: &ConflictSolverData) -> Result<ConflictSolveResult, ResolverError> {
        Ok(match self.strategy {
            ResolverStrategy::KeepCurrent => ConflictSolveResult::keep_current(&data.block),
            ResolverStrategy::KeepFormer => ConflictSolveResult::keep_former(&data.block),
            ResolverStrategy::IgnoreAll => ConflictSolveResult::Ignored,
            ResolverStrategy::LeaveUnresolved => ConflictSolveResult::Unresolved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::domain::MergeBlock;

    fn data() -> ConflictSolverData {
        let block = MergeBlock::conflict(vec!["a=1".into()], vec!["a=2".into()]);
        ConflictSolverData {
            path: "config.ini".into(),
            index: 0,
            total: 1,
            block_index: 0,
            content: "<<<<<<< former\na=1\n=======\na=2\n>>>>>>> current".into(),
            block,
        }
    }

    #[test]
    fn strategies_pick_their_side() {
        let current = StrategyResolver::new(ResolverStrategy::KeepCurrent)
            .resolve(&data())
            .unwrap();
        let former = StrategyResolver::new(ResolverStrategy::KeepFormer)
            .resolve(&data())
            .unwrap();

        assert!(matches!(current, ConflictSolveResult::Resolved(b) if b.settled_lines() == ["a=2"]));
        assert!(matches!(former, ConflictSolveResult::Resolved(b) if b.settled_lines() == ["a=1"]));
        assert_eq!(
            StrategyResolver::default().resolve(&data()).unwrap(),
            ConflictSolveResult::Unresolved
        );
    }

    #[test]
    fn strategy_names_parse() {
        for strategy in ResolverStrategy::ALL {
            assert_eq!(strategy.as_str().parse::<ResolverStrategy>(), Ok(strategy));
        }
        assert_eq!("theirs".parse(), Ok(ResolverStrategy::KeepCurrent));
        assert!("merge".parse::<ResolverStrategy>().is_err());
    }
}
