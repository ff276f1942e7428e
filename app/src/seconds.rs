#[derive(Debug, Clone, Copy)]
pub struct Seconds(pub i64);
