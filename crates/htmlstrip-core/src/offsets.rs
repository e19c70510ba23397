/// Maps positions in the stripped output back to positions in the original
/// input. A breakpoint is recorded whenever the mapping stops being a 1:1
/// continuation; lookups binary search for the latest breakpoint at or before
/// the queried output position.
#[derive(Debug, Default)]
pub(crate) struct OffsetMap {
    breakpoints: Vec<Breakpoint>,
}

#[derive(Clone, Copy, Debug)]
struct Breakpoint {
    output: usize,
    input: usize,
}

impl OffsetMap {
    pub(crate) fn new() -> Self {
        Self {
            breakpoints: Vec::new(),
        }
    }

    /// Input position that output position `out` projects to. With no
    /// breakpoint at or before `out` the mapping is the identity.
    pub(crate) fn project(&self, out: usize) -> usize {
        let idx = self.breakpoints.partition_point(|bp| bp.output <= out);
        match idx.checked_sub(1).and_then(|i| self.breakpoints.get(i)) {
            Some(bp) => bp.input + (out - bp.output),
            None => out,
        }
    }

    /// Record that output position `out` corresponds to input position `input`.
    /// Breakpoints must arrive in strictly increasing output order.
    pub(crate) fn record(&mut self, out: usize, input: usize) {
        debug_assert!(self.breakpoints.last().is_none_or(|bp| bp.output < out));
        self.breakpoints.push(Breakpoint { output: out, input });
    }
}
