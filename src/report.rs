use tracing::info;

/// Named sub-step outcomes of one pipeline phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseReport {
    pub header: String,
    pub logs: Vec<String>,
}

impl PhaseReport {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            logs: Vec::new(),
        }
    }

    pub fn push(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        if !msg.is_empty() {
            self.logs.push(msg);
        }
    }

    /// Log the report when verbose; a quiet run says nothing.
    pub fn emit(&self, verbose: bool) {
        if !verbose {
            return;
        }
        info!("------------------------");
        info!("-- {} --", self.header);
        info!("------------------------");
        for line in &self.logs {
            info!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_messages_are_dropped() {
        let mut r = PhaseReport::new("Prepare modules");
        r.push("All relations correct");
        r.push("");
        assert_eq!(r.logs, vec!["All relations correct"]);
    }
}
