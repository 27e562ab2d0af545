//! Test helpers for functions dealing with the wire protocol
// (c) 2026 Ferry contributors

use crate::protocol::common::{ReceivingStream, SendReceivePair, SendingStream};

use tokio::io::{simplex, ReadHalf, SimplexStream, WriteHalf};

pub(crate) type TestStreamPair = SendReceivePair<WriteHalf<SimplexStream>, ReadHalf<SimplexStream>>;

impl SendingStream for WriteHalf<SimplexStream> {}
impl ReceivingStream for ReadHalf<SimplexStream> {}

const STREAM_BUFFER_SIZE: usize = 65_536;

/// In order to test a streaming function we need a bi-directional stream.
/// Each side of the function under test takes the reader of one pipe
/// and the writer of the _opposite_ pipe.
pub(crate) fn new_test_plumbing() -> (TestStreamPair, TestStreamPair) {
    let p1 = simplex(STREAM_BUFFER_SIZE);
    let p2 = simplex(STREAM_BUFFER_SIZE);
    let r1 = (p1.1, p2.0).into();
    let r2 = (p2.1, p1.0).into();
    (r1, r2)
}
