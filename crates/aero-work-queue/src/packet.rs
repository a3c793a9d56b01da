//! Memory-style request/response packets carried across the work queue ports.

/// Opaque fixed-width work item. The queue never interprets its value.
pub type WorkToken = u32;

/// Width of a dedicated push/pop word, in bytes.
pub const WORD_SIZE: u64 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemCmd {
    ReadReq,
    WriteReq,
    ReadResp,
    WriteResp,
}

impl MemCmd {
    pub fn is_request(self) -> bool {
        matches!(self, Self::ReadReq | Self::WriteReq)
    }

    pub fn is_write(self) -> bool {
        matches!(self, Self::WriteReq | Self::WriteResp)
    }

    fn response(self) -> Self {
        match self {
            Self::ReadReq | Self::ReadResp => Self::ReadResp,
            Self::WriteReq | Self::WriteResp => Self::WriteResp,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    pub cmd: MemCmd,
    pub addr: u64,
    pub data: Option<WorkToken>,
    /// Set on an atomic response when the queue could not perform the operation (push while full,
    /// pop while empty).
    pub nacked: bool,
}

impl Packet {
    /// A push request: a write of `token` to the queue's push word.
    pub fn write(addr: u64, token: WorkToken) -> Self {
        Self {
            cmd: MemCmd::WriteReq,
            addr,
            data: Some(token),
            nacked: false,
        }
    }

    /// A pop request: a read of the queue's pop word.
    pub fn read(addr: u64) -> Self {
        Self {
            cmd: MemCmd::ReadReq,
            addr,
            data: None,
            nacked: false,
        }
    }

    pub fn is_response(&self) -> bool {
        !self.cmd.is_request()
    }

    /// Turns this request into its response in place. Read responses carry `data`; write
    /// responses carry nothing.
    pub fn make_response(&mut self, data: Option<WorkToken>) {
        self.cmd = self.cmd.response();
        self.data = data;
    }

    pub fn make_nack(&mut self) {
        self.make_response(None);
        self.nacked = true;
    }
}
