/// Push/pop counters for one work queue instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkQueueStats {
    pub pushes: u64,
    pub pops: u64,
}

/// Sink for named scalar statistics.
pub trait StatsVisitor {
    fn visit_scalar(&mut self, path: &str, desc: &str, value: u64);
}

impl WorkQueueStats {
    /// Reports the counters as `<prefix>.pushes` and `<prefix>.pops`.
    pub fn visit(&self, prefix: &str, visitor: &mut dyn StatsVisitor) {
        visitor.visit_scalar(
            &format!("{prefix}.pushes"),
            "Number of pushes to the work queue",
            self.pushes,
        );
        visitor.visit_scalar(
            &format!("{prefix}.pops"),
            "Number of pops from the work queue",
            self.pops,
        );
    }
}
