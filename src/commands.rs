//! Console-style command dispatch.
//!
//! Whitespace-separated commands applied to a live mixer handle, used by
//! the `scmix console` loop and exercised directly in tests. Fades issued
//! from the console are linear and decide their direction from the current
//! volume, matching `fade-to`'s interactive intent.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::dsp::FadeCurve;
use crate::error::CommandError;
use crate::handle::MixerHandle;
use crate::mixer::BusKind;

/// Static description of one console command.
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
}

/// Command table consulted by the dispatcher and the help output.
pub static COMMANDS: Lazy<Vec<CommandSpec>> = Lazy::new(|| {
    vec![
        CommandSpec {
            name: "fade-to",
            usage: "fade-to <bus> <level> <duration>",
            help: "Smoothly adjusts a sound class volume to the target level.",
        },
        CommandSpec {
            name: "set-volume",
            usage: "set-volume <bus> <level>",
            help: "Sets a sound class volume immediately.",
        },
        CommandSpec {
            name: "get-volume",
            usage: "get-volume <bus>",
            help: "Prints the current and target volume of a sound class.",
        },
        CommandSpec {
            name: "snapshot",
            usage: "snapshot",
            help: "Prints every bus as a JSON line.",
        },
        CommandSpec {
            name: "toggle-debug-draw",
            usage: "toggle-debug-draw",
            help: "Toggles the volume table printed after each command.",
        },
        CommandSpec {
            name: "help",
            usage: "help",
            help: "Prints this command list.",
        },
    ]
});

/// Dispatches console lines against a mixer handle.
pub struct CommandRegistry {
    handle: Arc<MixerHandle>,
    #[cfg(feature = "debug-draw")]
    debug_draw_enabled: bool,
}

impl CommandRegistry {
    pub fn new(handle: Arc<MixerHandle>) -> Self {
        Self {
            handle,
            #[cfg(feature = "debug-draw")]
            debug_draw_enabled: false,
        }
    }

    /// Whether the volume table should be printed after each command.
    #[cfg(feature = "debug-draw")]
    pub fn debug_draw_enabled(&self) -> bool {
        self.debug_draw_enabled
    }

    /// Renders the volume table for the current snapshot.
    #[cfg(feature = "debug-draw")]
    pub fn render_overlay(&self) -> Result<Vec<String>, CommandError> {
        let rows = self.handle.snapshot()?;
        Ok(crate::overlay::VolumeTable::from_snapshots(&rows).render())
    }

    /// Parses and runs one console line, returning the lines to print.
    ///
    /// Empty lines are no-ops.
    pub fn dispatch(&mut self, line: &str) -> Result<Vec<String>, CommandError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, args)) = tokens.split_first() else {
            return Ok(Vec::new());
        };

        match name {
            "fade-to" => self.cmd_fade_to(args),
            "set-volume" => self.cmd_set_volume(args),
            "get-volume" => self.cmd_get_volume(args),
            "snapshot" => self.cmd_snapshot(),
            "toggle-debug-draw" => self.cmd_toggle_debug_draw(),
            "help" => Ok(Self::help_lines()),
            other => Err(CommandError::UnknownCommand {
                name: other.to_string(),
            }),
        }
    }

    fn help_lines() -> Vec<String> {
        COMMANDS
            .iter()
            .map(|spec| format!("{:<40} {}", spec.usage, spec.help))
            .collect()
    }

    fn cmd_fade_to(&mut self, args: &[&str]) -> Result<Vec<String>, CommandError> {
        if args.len() < 3 {
            return Err(CommandError::MissingArguments {
                command: "fade-to",
                got: args.len(),
                want: 3,
            });
        }
        let bus = args[0];
        let level = parse_f32("level", args[1])?;
        let duration = parse_f32("duration", args[2])?;

        self.handle
            .fade_to(BusKind::SoundClass, bus, level, duration, FadeCurve::Linear)?;
        Ok(vec![format!(
            "Fading {} to {:.4} over {:.2}s",
            bus, level, duration
        )])
    }

    fn cmd_set_volume(&mut self, args: &[&str]) -> Result<Vec<String>, CommandError> {
        if args.len() < 2 {
            return Err(CommandError::MissingArguments {
                command: "set-volume",
                got: args.len(),
                want: 2,
            });
        }
        let bus = args[0];
        let volume = parse_f32("level", args[1])?;

        self.handle.set_volume(BusKind::SoundClass, bus, volume)?;
        Ok(vec![format!("Set {} to {:.4}", bus, volume)])
    }

    fn cmd_get_volume(&mut self, args: &[&str]) -> Result<Vec<String>, CommandError> {
        if args.is_empty() {
            return Err(CommandError::MissingArguments {
                command: "get-volume",
                got: 0,
                want: 1,
            });
        }
        let bus = args[0];
        let volume = self.handle.volume(BusKind::SoundClass, bus)?;
        let target = self.handle.target_volume(BusKind::SoundClass, bus)?;
        Ok(vec![format!("{} {:.4} -> {:.4}", bus, volume, target)])
    }

    fn cmd_snapshot(&mut self) -> Result<Vec<String>, CommandError> {
        let rows = self.handle.snapshot()?;
        rows.iter()
            .map(|row| {
                serde_json::to_string(row).map_err(|err| CommandError::Render {
                    reason: err.to_string(),
                })
            })
            .collect()
    }

    #[cfg(feature = "debug-draw")]
    fn cmd_toggle_debug_draw(&mut self) -> Result<Vec<String>, CommandError> {
        self.debug_draw_enabled = !self.debug_draw_enabled;
        let state = if self.debug_draw_enabled {
            "enabled"
        } else {
            "disabled"
        };
        Ok(vec![format!("Debug draw {}", state)])
    }

    #[cfg(not(feature = "debug-draw"))]
    fn cmd_toggle_debug_draw(&mut self) -> Result<Vec<String>, CommandError> {
        Err(CommandError::Unsupported {
            command: "toggle-debug-draw",
        })
    }
}

fn parse_f32(argument: &'static str, value: &str) -> Result<f32, CommandError> {
    value
        .parse::<f32>()
        .map_err(|_| CommandError::InvalidArgument {
            argument,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MixerConfig;
    use crate::mixer::BusDecl;

    fn registry() -> CommandRegistry {
        let mut config = MixerConfig::default();
        config.classes = vec![BusDecl::named("Music"), BusDecl::named("Ambience")];
        CommandRegistry::new(Arc::new(MixerHandle::new(config)))
    }

    #[test]
    fn test_empty_line_is_a_noop() {
        let mut registry = registry();
        assert!(registry.dispatch("").unwrap().is_empty());
        assert!(registry.dispatch("   ").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let mut registry = registry();
        let err = registry.dispatch("fade Music 0.5 1").unwrap_err();
        assert!(matches!(err, CommandError::UnknownCommand { .. }));
    }

    #[test]
    fn test_fade_to_requires_three_arguments() {
        let mut registry = registry();
        let err = registry.dispatch("fade-to Music").unwrap_err();
        assert_eq!(
            err,
            CommandError::MissingArguments {
                command: "fade-to",
                got: 1,
                want: 3,
            }
        );
    }

    #[test]
    fn test_fade_to_starts_a_linear_fade() {
        let mut registry = registry();
        let lines = registry.dispatch("fade-to Music 0.25 2.0").unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Music"));

        let handle = Arc::clone(&registry.handle);
        let target = handle.target_volume(BusKind::SoundClass, "Music").unwrap();
        assert!((target - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_bad_float_reports_the_argument() {
        let mut registry = registry();
        let err = registry.dispatch("fade-to Music loud 1.0").unwrap_err();
        assert_eq!(
            err,
            CommandError::InvalidArgument {
                argument: "level",
                value: "loud".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_bus_passes_through_as_mixer_error() {
        let mut registry = registry();
        let err = registry.dispatch("get-volume Nope").unwrap_err();
        assert!(matches!(err, CommandError::Mixer(_)));
    }

    #[test]
    fn test_set_and_get_volume_round_trip() {
        let mut registry = registry();
        registry.dispatch("set-volume Music 0.5").unwrap();

        let lines = registry.dispatch("get-volume Music").unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Music"));
        assert!(lines[0].contains("0.5000"));
    }

    #[test]
    fn test_snapshot_prints_one_json_line_per_bus() {
        let mut registry = registry();
        let lines = registry.dispatch("snapshot").unwrap();
        assert_eq!(lines.len(), 2);
        for line in &lines {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(parsed.get("name").is_some());
            assert!(parsed.get("volume").is_some());
        }
    }

    #[test]
    fn test_help_covers_every_command() {
        let mut registry = registry();
        let lines = registry.dispatch("help").unwrap();
        assert_eq!(lines.len(), COMMANDS.len());
        for spec in COMMANDS.iter() {
            assert!(lines.iter().any(|line| line.contains(spec.name)));
        }
    }

    #[cfg(feature = "debug-draw")]
    #[test]
    fn test_toggle_debug_draw_flips_state() {
        let mut registry = registry();
        assert!(!registry.debug_draw_enabled());

        registry.dispatch("toggle-debug-draw").unwrap();
        assert!(registry.debug_draw_enabled());
        assert!(!registry.render_overlay().unwrap().is_empty());

        registry.dispatch("toggle-debug-draw").unwrap();
        assert!(!registry.debug_draw_enabled());
    }

    #[cfg(not(feature = "debug-draw"))]
    #[test]
    fn test_toggle_debug_draw_is_unsupported_without_the_feature() {
        let mut registry = registry();
        let err = registry.dispatch("toggle-debug-draw").unwrap_err();
        assert_eq!(
            err,
            CommandError::Unsupported {
                command: "toggle-debug-draw",
            }
        );
    }
}
