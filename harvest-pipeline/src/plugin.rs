//! Pipeline plugin trait for extensibility.

use eyre::Result;

use crate::{PassInput, PassOutput};

/// A plugin that can hook into the build pipeline.
///
/// Plugins receive callbacks before and after each feature's pass, allowing
/// them to inspect the pass or adjust its output.
///
/// # Example
///
/// ```ignore
/// struct TimingPlugin {
///     start_times: Mutex<HashMap<String, Instant>>,
/// }
///
/// impl Plugin for TimingPlugin {
///     fn name(&self) -> &'static str { "timing" }
///
///     fn on_before_pass(&self, feature: &str, _input: &PassInput<'_>) -> Result<()> {
///         self.start_times.lock().unwrap().insert(feature.to_string(), Instant::now());
///         Ok(())
///     }
///
///     fn on_after_pass(&self, feature: &str, _output: &mut PassOutput) -> Result<()> {
///         if let Some(start) = self.start_times.lock().unwrap().get(feature) {
///             println!("{} took {:?}", feature, start.elapsed());
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Plugin: Send + Sync {
    /// The name of this plugin (for debugging and logging).
    fn name(&self) -> &'static str;

    /// Called before a feature's pass runs.
    ///
    /// # Errors
    ///
    /// Return an error to abort the build.
    #[allow(unused_variables)]
    fn on_before_pass(&self, feature: &str, input: &PassInput<'_>) -> Result<()> {
        Ok(())
    }

    /// Called after a feature's pass completed.
    ///
    /// # Errors
    ///
    /// Return an error to abort the build.
    #[allow(unused_variables)]
    fn on_after_pass(&self, feature: &str, output: &mut PassOutput) -> Result<()> {
        Ok(())
    }
}
