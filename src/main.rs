//! Möbius clock.
//!
//! A clock whose dial ring is a twisted strip, rendered with wgpu inside an
//! iced application. All geometry is regenerated and re-uploaded every
//! frame; the strip's twist travels around the ring while the hands follow
//! the wall clock. Drag to rotate, Shift-drag to roll, scroll to zoom.

use clap::Parser;
use iced::time::Instant;
use iced::widget::{Column, PickList, Row, Shader, Slider, button, checkbox, text};
use iced::{Element, Length, Settings, Subscription, Task};

mod camera;
mod clock;
mod config;
mod error;
mod geometry;
mod math;
mod renderer;
mod scene;
mod shader_widget;
mod texture;

use clock::{Animation, ClockTime};
use config::{Cli, ClockSettings, MAX_HALF_TWISTS, MAX_SEGMENTS, MIN_SEGMENTS};
use error::Error;
use scene::{FrameParams, Stage};
use shader_widget::ClockShaderProgram;

/// Main application state - handles UI controls and the clocks
#[derive(Debug)]
pub(crate) struct MobiusApp {
    settings: ClockSettings,
    stage: Stage,
    half_twists: u32,
    segments: u32,
    animation: Animation,
    time: ClockTime,
    reset_generation: u64,
}

/// Messages that the application can receive
#[derive(Debug, Clone)]
pub(crate) enum Message {
    Tick(Instant),
    Stage(Stage),
    HalfTwists(f32),
    Segments(f32),
    Animate(bool),
    ResetView,
}

impl MobiusApp {
    pub(crate) fn new(settings: ClockSettings) -> Self {
        Self {
            stage: settings.stage,
            half_twists: settings.half_twists,
            segments: settings.segments,
            animation: Animation::new(settings.animate),
            time: ClockTime::now(settings.utc_offset),
            reset_generation: 0,
            settings,
        }
    }

    pub(crate) fn title(&self) -> &'static str {
        "Möbius Clock"
    }

    pub(crate) fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick(now) => {
                self.animation.tick(now);
                self.time = ClockTime::now(self.settings.utc_offset);
            }
            Message::Stage(stage) => {
                log::info!("stage changed to {stage}");
                self.stage = stage;
            }
            Message::HalfTwists(value) => {
                self.half_twists = value.round() as u32;
            }
            Message::Segments(value) => {
                self.segments = value.round() as u32;
            }
            Message::Animate(running) => {
                self.animation.set_running(running);
            }
            Message::ResetView => {
                self.reset_generation += 1;
            }
        }

        Task::none()
    }

    pub(crate) fn subscription(&self) -> Subscription<Message> {
        iced::window::frames().map(Message::Tick)
    }

    fn frame_params(&self) -> FrameParams {
        FrameParams {
            stage: self.stage,
            half_twists: self.half_twists,
            steps: self.segments,
            torsion: self.animation.torsion(),
            time: self.time,
        }
    }

    pub(crate) fn view(&self) -> Element<Message> {
        // Left pane with controls
        let controls = Column::new()
            .spacing(20)
            .push(
                Column::new()
                    .spacing(5)
                    .push(text("Stage"))
                    .push(PickList::new(&Stage::ALL[..], Some(self.stage), Message::Stage).width(250)),
            )
            .push(
                Column::new()
                    .spacing(5)
                    .push(text(format!("Half twists: {}", self.half_twists)))
                    .push(
                        Slider::new(
                            0.0..=MAX_HALF_TWISTS as f32,
                            self.half_twists as f32,
                            Message::HalfTwists,
                        )
                        .step(1.0)
                        .width(250),
                    ),
            )
            .push(
                Column::new()
                    .spacing(5)
                    .push(text(format!("Segments: {}", self.segments)))
                    .push(
                        Slider::new(
                            MIN_SEGMENTS as f32..=MAX_SEGMENTS as f32,
                            self.segments as f32,
                            Message::Segments,
                        )
                        .step(1.0)
                        .width(250),
                    ),
            )
            .push(checkbox("Animate", self.animation.is_running()).on_toggle(Message::Animate))
            .push(button("Reset view").on_press(Message::ResetView));

        // Right pane with 3D viewport
        let viewport = Shader::new(ClockShaderProgram::new(
            self.frame_params(),
            self.settings.dial.clone(),
            self.reset_generation,
        ))
        .width(Length::Fill)
        .height(Length::Fill);

        // Main layout: left controls + right viewport
        Row::new()
            .spacing(10)
            .padding(10)
            .push(
                iced::widget::container(controls)
                    .width(Length::Shrink)
                    .height(Length::Fill),
            )
            .push(viewport)
            .into()
    }
}

/// Entry point for the Möbius clock
fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    env_logger::builder()
        .format_timestamp(None)
        .filter_level(cli.log_filter())
        .parse_default_env()
        .init();

    let settings = cli
        .validate()
        .inspect_err(|error| log::error!("{error}"))?;
    log::info!(
        "starting at stage {} with {} half twists, {} segments, utc offset {}h",
        settings.stage,
        settings.half_twists,
        settings.segments,
        settings.utc_offset
    );

    let app = MobiusApp::new(settings);
    iced::application(app.title(), MobiusApp::update, MobiusApp::view)
        .subscription(MobiusApp::subscription)
        .settings(Settings {
            antialiasing: true,
            ..Settings::default()
        })
        .run_with(move || (app, Task::none()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn app() -> MobiusApp {
        let cli = Cli::try_parse_from(["mobius-clock", "--stage", "colored"]).expect("valid arguments");
        MobiusApp::new(cli.validate().expect("valid settings"))
    }

    #[test]
    fn sliders_round_to_whole_values() {
        let mut app = app();
        let _ = app.update(Message::HalfTwists(4.6));
        let _ = app.update(Message::Segments(47.2));
        assert_eq!(app.frame_params().half_twists, 5);
        assert_eq!(app.frame_params().steps, 47);
    }

    #[test]
    fn ticks_advance_the_torsion_only_while_animating() {
        let mut app = app();
        let start = Instant::now();
        let _ = app.update(Message::Tick(start));
        let _ = app.update(Message::Tick(start + Duration::from_millis(2500)));
        let running = app.frame_params().torsion;
        assert!(running > 0.0);

        let _ = app.update(Message::Animate(false));
        let _ = app.update(Message::Tick(start + Duration::from_secs(4)));
        assert_eq!(app.frame_params().torsion, running);
    }

    #[test]
    fn stage_and_reset_messages_update_state() {
        let mut app = app();
        assert_eq!(app.frame_params().stage, Stage::Colored);
        let _ = app.update(Message::Stage(Stage::Lit));
        let _ = app.update(Message::ResetView);
        assert_eq!(app.frame_params().stage, Stage::Lit);
        assert_eq!(app.reset_generation, 1);
    }
}
