use crate::domain::snapshot::SnapshotChain;

/// Something that yields a snapshot chain (a capture file, a test fixture).
pub trait SnapshotSource {
    /// Short name used in logs and batch output.
    fn describe(&self) -> String;
    fn load(&self) -> anyhow::Result<SnapshotChain>;
}

/// Receives rendered lines, in order. One `begin`/`finish` pair per rendered capture.
pub trait TraceSink {
    fn begin(&mut self, _source: &str) -> anyhow::Result<()> {
        Ok(())
    }
    fn line(&mut self, line: &str) -> anyhow::Result<()>;
    fn finish(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl SnapshotSource for SnapshotChain {
    fn describe(&self) -> String {
        "<memory>".to_string()
    }

    fn load(&self) -> anyhow::Result<SnapshotChain> {
        Ok(self.clone())
    }
}
