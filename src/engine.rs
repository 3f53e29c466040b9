use std::sync::Arc;

use tracing::info;

use crate::error::{Error, Result};
use crate::rules::RuleTable;

/// Owns the current rule table.
///
/// The table sits behind an `Arc` and is replaced wholesale on reload, so a
/// scan running on a [`snapshot`](Engine::snapshot) never sees a
/// half-built table.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    table: Option<Arc<RuleTable>>,
}

impl Engine {
    /// An engine with no rules loaded yet.
    pub fn new() -> Self {
        Engine { table: None }
    }

    pub fn build<I, P, R>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, R)>,
        P: AsRef<str>,
        R: Into<String>,
    {
        let mut engine = Engine::new();
        engine.load(pairs)?;
        Ok(engine)
    }

    /// Replaces the rule table. On error the previous table stays in place.
    pub fn load<I, P, R>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (P, R)>,
        P: AsRef<str>,
        R: Into<String>,
    {
        let table = RuleTable::build(pairs)?;
        info!(
            "rule table loaded: {} -> {} rules",
            self.rule_count(),
            table.len()
        );
        self.table = Some(Arc::new(table));
        Ok(())
    }

    pub fn transliterate(&self, text: &str) -> Result<String> {
        let table = self.table.as_ref().ok_or(Error::EngineNotReady)?;
        Ok(table.transliterate(text))
    }

    /// Shared read-only handle on the current table, for use across threads.
    pub fn snapshot(&self) -> Result<Arc<RuleTable>> {
        self.table.clone().ok_or(Error::EngineNotReady)
    }

    pub fn is_ready(&self) -> bool {
        self.table.is_some()
    }

    pub fn rule_count(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.len())
    }
}
