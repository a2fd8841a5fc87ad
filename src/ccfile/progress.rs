/// Receives coarse progress while a file is decoded or saved.
///
/// Reports are advisory and delivered synchronously from the calling
/// thread, after each pipeline stage. `percent` runs from 0 to 100.
///
/// Any `FnMut(&str, u8)` closure is a sink:
///
/// ```
/// use gdshare::Progress;
///
/// let mut seen = Vec::new();
/// let mut sink = |stage: &str, percent: u8| seen.push((stage.to_string(), percent));
/// sink.report("gzip", 80);
/// assert_eq!(seen, vec![(String::from("gzip"), 80)]);
/// ```
pub trait Progress {
    fn report(&mut self, stage: &str, percent: u8);
}

impl<F> Progress for F
where
    F: FnMut(&str, u8),
{
    fn report(&mut self, stage: &str, percent: u8) {
        self(stage, percent)
    }
}

/// A progress sink that discards every report
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&mut self, _stage: &str, _percent: u8) {}
}
