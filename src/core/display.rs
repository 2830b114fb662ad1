use crate::config::FullscreenType;
use log::{info, warn};
use std::collections::HashMap;
use winit::{
    dpi::PhysicalPosition, event_loop::ActiveEventLoop, monitor::MonitorHandle, window::Fullscreen,
};

/// Display count used when real secondary outputs cannot be driven
/// (development builds) or the platform reports none.
pub const DEV_DISPLAY_COUNT: usize = 2;

/// Number of displays the session will route to. Read once at startup.
pub const fn resolve_display_count(reported: usize, dev_mode: bool) -> usize {
    if dev_mode || reported == 0 {
        DEV_DISPLAY_COUNT
    } else {
        reported
    }
}

/// Suffix repeated names with " (2)", " (3)", ... so every entry is unique.
pub fn dedup_display_names(names: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .map(|base_name| {
            let entry = seen.entry(base_name.clone()).or_insert(0);
            *entry += 1;
            if *entry == 1 {
                base_name
            } else {
                format!("{} ({})", base_name, *entry)
            }
        })
        .collect()
}

/// Returns a best-effort friendly name for each monitor handle, falling back
/// to "Screen N" when the platform does not name a monitor.
pub fn friendly_monitor_names(monitors: &[MonitorHandle]) -> Vec<String> {
    let names = monitors
        .iter()
        .enumerate()
        .map(|(idx, monitor)| {
            monitor
                .name()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("Screen {}", idx + 1))
        })
        .collect();
    dedup_display_names(names)
}

/// Resolve a monitor handle from the requested index, returning (handle, count, `clamped_index`).
pub fn resolve_monitor(
    event_loop: &ActiveEventLoop,
    monitor_index: usize,
) -> (Option<MonitorHandle>, usize, usize) {
    let monitors: Vec<MonitorHandle> = event_loop.available_monitors().collect();
    let count = monitors.len();
    if monitors.is_empty() {
        return (event_loop.primary_monitor(), 0, 0);
    }
    let clamped = monitor_index.min(count.saturating_sub(1));
    let handle = monitors
        .get(clamped)
        .cloned()
        .or_else(|| monitors.first().cloned())
        .or_else(|| event_loop.primary_monitor());
    (handle, count, clamped)
}

/// Top-left corner that centers a `width`x`height` window inside the monitor
/// rectangle, clamped to its bounds.
pub fn centered_position(
    monitor_pos: (i32, i32),
    monitor_size: (u32, u32),
    width: u32,
    height: u32,
) -> Option<(i32, i32)> {
    let mon_w = monitor_size.0 as i32;
    let mon_h = monitor_size.1 as i32;
    let win_w = width as i32;
    let win_h = height as i32;
    if mon_w <= 0 || mon_h <= 0 || win_w <= 0 || win_h <= 0 {
        return None;
    }

    let center_x = monitor_pos.0 + (mon_w.saturating_sub(win_w)) / 2;
    let center_y = monitor_pos.1 + (mon_h.saturating_sub(win_h)) / 2;
    let max_x = monitor_pos.0 + mon_w.saturating_sub(win_w).max(0);
    let max_y = monitor_pos.1 + mon_h.saturating_sub(win_h).max(0);

    Some((
        center_x.clamp(monitor_pos.0, max_x),
        center_y.clamp(monitor_pos.1, max_y),
    ))
}

/// Center the window on the given monitor, clamped to the monitor's bounds.
pub fn default_window_position(
    width: u32,
    height: u32,
    monitor: Option<MonitorHandle>,
) -> Option<PhysicalPosition<i32>> {
    let mon = monitor?;
    let pos = mon.position();
    let size = mon.size();
    centered_position((pos.x, pos.y), (size.width, size.height), width, height)
        .map(|(x, y)| PhysicalPosition::new(x, y))
}

/// Fullscreen mode for a secondary output window. Exclusive picks the
/// monitor's largest mode at its highest refresh rate.
pub fn output_fullscreen(
    fullscreen_type: FullscreenType,
    monitor: Option<MonitorHandle>,
    event_loop: &ActiveEventLoop,
) -> Fullscreen {
    let mon = monitor.or_else(|| event_loop.primary_monitor());
    match fullscreen_type {
        FullscreenType::Exclusive => {
            let Some(mon) = mon else {
                warn!("No monitor reported for output; using BORDERLESS fullscreen.");
                return Fullscreen::Borderless(None);
            };
            let best_mode = mon.video_modes().max_by_key(|m| {
                let sz = m.size();
                (
                    u64::from(sz.width) * u64::from(sz.height),
                    m.refresh_rate_millihertz(),
                )
            });
            if let Some(mode) = best_mode {
                info!(
                    "Output fullscreen: using EXCLUSIVE {}x{} @ {} mHz",
                    mode.size().width,
                    mode.size().height,
                    mode.refresh_rate_millihertz()
                );
                Fullscreen::Exclusive(mode)
            } else {
                warn!("No EXCLUSIVE mode advertised; using BORDERLESS.");
                Fullscreen::Borderless(Some(mon))
            }
        }
        FullscreenType::Borderless => Fullscreen::Borderless(mon),
    }
}

#[cfg(test)]
mod tests {
    use super::{DEV_DISPLAY_COUNT, centered_position, dedup_display_names, resolve_display_count};

    #[test]
    fn dev_mode_and_missing_monitors_use_fixed_count() {
        assert_eq!(resolve_display_count(4, true), DEV_DISPLAY_COUNT);
        assert_eq!(resolve_display_count(0, false), DEV_DISPLAY_COUNT);
        assert_eq!(resolve_display_count(3, false), 3);
        assert_eq!(resolve_display_count(1, false), 1);
    }

    #[test]
    fn duplicate_names_get_numbered() {
        let names = vec![
            "DELL U2415".to_string(),
            "Screen 2".to_string(),
            "DELL U2415".to_string(),
            "DELL U2415".to_string(),
        ];
        assert_eq!(
            dedup_display_names(names),
            vec!["DELL U2415", "Screen 2", "DELL U2415 (2)", "DELL U2415 (3)"]
        );
    }

    #[test]
    fn centered_position_clamps_to_monitor() {
        assert_eq!(
            centered_position((1920, 0), (1920, 1080), 1280, 720),
            Some((1920 + 320, 180))
        );
        assert_eq!(
            centered_position((0, 0), (800, 600), 1280, 720),
            Some((0, 0)),
            "oversized windows pin to the monitor origin"
        );
        assert_eq!(centered_position((0, 0), (0, 1080), 1280, 720), None);
    }
}
