use log::{debug, info, trace};
use std::{error::Error, num::NonZeroU32, sync::Arc};
use winit::window::Window;

/// Tracks which physical outputs have been switched on.
///
/// Output 0 is the primary display and is always active. Activation is
/// one-way: once an output is on it stays on for the rest of the process, the
/// same way a display woken by the platform cannot be put back to sleep.
#[derive(Debug)]
pub struct OutputRouter {
    controllable: bool,
    active: Vec<bool>,
    pending: Vec<usize>,
}

impl OutputRouter {
    pub fn new(display_count: usize, controllable: bool) -> Self {
        let mut active = vec![false; display_count.max(1)];
        active[0] = true;
        Self {
            controllable,
            active,
            pending: Vec::new(),
        }
    }

    pub const fn is_controllable(&self) -> bool {
        self.controllable
    }

    /// Request output routing to `zero_based`. Returns true if this call
    /// switched the output on.
    pub fn activate(&mut self, zero_based: usize) -> bool {
        if !self.controllable {
            trace!("Output {zero_based} activation skipped: outputs are not controllable here.");
            return false;
        }
        match self.active.get_mut(zero_based) {
            Some(active) if !*active => {
                *active = true;
                self.pending.push(zero_based);
                info!("Activated display output {}", zero_based + 1);
                true
            }
            Some(_) => false,
            None => {
                debug!("Ignoring activation of unknown output {zero_based}");
                false
            }
        }
    }

    #[cfg(test)]
    pub fn is_active(&self, zero_based: usize) -> bool {
        self.active.get(zero_based).copied().unwrap_or(false)
    }

    /// Outputs activated since the last call, in activation order.
    pub fn take_pending(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.pending)
    }
}

#[inline(always)]
pub fn pack_rgb(color: [f32; 3]) -> u32 {
    let [r, g, b] = color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u32);
    (r << 16) | (g << 8) | b
}

/// A window on one physical output, presented with a solid clear color.
pub struct OutputWindow {
    pub window: Arc<Window>,
    _context: softbuffer::Context<Arc<Window>>,
    surface: softbuffer::Surface<Arc<Window>, Arc<Window>>,
}

impl OutputWindow {
    pub fn new(window: Arc<Window>) -> Result<Self, Box<dyn Error>> {
        let context = softbuffer::Context::new(window.clone())?;
        let surface = softbuffer::Surface::new(&context, window.clone())?;
        Ok(Self {
            window,
            _context: context,
            surface,
        })
    }

    pub fn present(&mut self, clear: u32) -> Result<(), Box<dyn Error>> {
        let size = self.window.inner_size();
        let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return Ok(());
        };
        self.surface.resize(w, h)?;
        let mut buffer = self.surface.buffer_mut()?;
        buffer.fill(clear);
        buffer.present()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{OutputRouter, pack_rgb};

    #[test]
    fn primary_output_is_always_active() {
        let router = OutputRouter::new(3, true);
        assert!(router.is_active(0));
        assert!(!router.is_active(1));
        assert!(!router.is_active(7));
    }

    #[test]
    fn activation_is_queued_once() {
        let mut router = OutputRouter::new(3, true);
        assert!(router.activate(2));
        assert!(!router.activate(2), "second activation is a no-op");
        assert!(!router.activate(0), "primary is already active");
        assert_eq!(router.take_pending(), vec![2]);
        assert!(router.take_pending().is_empty());
        assert!(router.is_active(2));
    }

    #[test]
    fn out_of_range_and_uncontrollable_requests_do_nothing() {
        let mut router = OutputRouter::new(2, true);
        assert!(!router.activate(5));
        assert!(router.take_pending().is_empty());

        let mut fixed = OutputRouter::new(2, false);
        assert!(!fixed.activate(1));
        assert!(!fixed.is_active(1));
        assert!(fixed.take_pending().is_empty());
    }

    #[test]
    fn pack_rgb_clamps_channels() {
        assert_eq!(pack_rgb([1.0, 0.0, 0.0]), 0x00FF_0000);
        assert_eq!(pack_rgb([2.0, -1.0, 1.0]), 0x00FF_00FF);
    }
}
