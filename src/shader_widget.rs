//! Shader widget hosting the clock viewport.
//!
//! The program owns the interaction state (orientation, zoom, drag) while the
//! application supplies the frame parameters. Each frame the primitive
//! rebuilds the scene from those parameters and hands it to the renderer.

use std::sync::Arc;

use iced::widget::shader::{self, wgpu};
use iced::{Point, Rectangle, event, mouse};
use image::RgbaImage;
use nalgebra::Matrix4;

use crate::Message;
use crate::camera::{Camera, FrameUniform, Projection};
use crate::math::{drag_rotation, roll_rotation};
use crate::renderer::Renderer;
use crate::scene::{self, FrameParams};

/// Everything the GPU side needs to draw one frame.
#[derive(Debug, Clone)]
pub(crate) struct ClockPrimitive {
    pub(crate) params: FrameParams,
    pub(crate) orientation: Matrix4<f32>,
    pub(crate) camera: Camera,
    pub(crate) projection: Projection,
    pub(crate) dial: Arc<RgbaImage>,
}

impl shader::Primitive for ClockPrimitive {
    fn prepare(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        storage: &mut shader::Storage,
        bounds: &Rectangle,
        viewport: &shader::Viewport,
    ) {
        let scale = viewport.scale_factor() as f32;
        let physical_bounds = Rectangle {
            x: bounds.x * scale,
            y: bounds.y * scale,
            width: bounds.width * scale,
            height: bounds.height * scale,
        };

        if !storage.has::<Renderer>() {
            let renderer = pollster::block_on(Renderer::new(
                device,
                queue,
                format,
                physical_bounds,
                viewport.physical_size(),
                &self.dial,
            ))
            .unwrap_or_else(|error| {
                log::error!("failed to create the clock renderer: {error}");
                panic!("failed to create the clock renderer: {error}");
            });
            storage.store(renderer);
        }
        let Some(renderer) = storage.get_mut::<Renderer>() else {
            return;
        };

        renderer.resize(device, physical_bounds, viewport.physical_size());

        let shapes = scene::build(&self.params);
        let frame = FrameUniform::new(&self.orientation, &self.camera, &self.projection);
        renderer.prepare_frame(device, queue, &frame, &shapes);
    }

    fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        storage: &shader::Storage,
        target: &wgpu::TextureView,
        _clip_bounds: &Rectangle<u32>,
    ) {
        if let Some(renderer) = storage.get::<Renderer>() {
            renderer.render(encoder, target);
        }
    }
}

/// Interaction state kept by the widget between frames.
pub(crate) struct ClockShaderState {
    orientation: Matrix4<f32>,
    camera: Camera,
    projection: Projection,
    dragging: bool,
    last_cursor: Option<Point>,
    shift_pressed: bool,
    /// Last reset request honoured, see [`ClockShaderProgram::reset_generation`].
    reset_generation: u64,
}

impl ClockShaderState {
    fn reset_view(&mut self) {
        self.orientation = Matrix4::identity();
        self.camera = Camera::new();
        self.dragging = false;
        self.last_cursor = None;
    }
}

impl Default for ClockShaderState {
    fn default() -> Self {
        Self {
            orientation: Matrix4::identity(),
            camera: Camera::new(),
            projection: Projection::new(1.0),
            dragging: false,
            last_cursor: None,
            shift_pressed: false,
            reset_generation: 0,
        }
    }
}

/// The shader program drawing the clock.
pub(crate) struct ClockShaderProgram {
    params: FrameParams,
    dial: Arc<RgbaImage>,
    /// Bumped by the application to request a view reset.
    reset_generation: u64,
}

impl ClockShaderProgram {
    pub(crate) fn new(params: FrameParams, dial: Arc<RgbaImage>, reset_generation: u64) -> Self {
        Self {
            params,
            dial,
            reset_generation,
        }
    }
}

impl shader::Program<Message> for ClockShaderProgram {
    type State = ClockShaderState;
    type Primitive = ClockPrimitive;

    fn update(
        &self,
        state: &mut Self::State,
        event: shader::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
        _shell: &mut iced::advanced::Shell<'_, Message>,
    ) -> (event::Status, Option<Message>) {
        if state.reset_generation != self.reset_generation {
            state.reset_generation = self.reset_generation;
            state.reset_view();
        }

        state.projection.resize(bounds.width, bounds.height);

        let status = match event {
            shader::Event::Mouse(mouse_event) => {
                self.handle_mouse_event(state, mouse_event, bounds, cursor)
            }
            shader::Event::Keyboard(keyboard_event) => {
                self.handle_keyboard_event(state, keyboard_event)
            }
            _ => event::Status::Ignored,
        };

        (status, None)
    }

    fn draw(
        &self,
        state: &Self::State,
        _cursor: mouse::Cursor,
        bounds: Rectangle,
    ) -> Self::Primitive {
        let mut projection = state.projection;
        projection.resize(bounds.width, bounds.height);

        // A pending reset is drawn immediately, before the next event arrives.
        let (orientation, camera) = if state.reset_generation == self.reset_generation {
            (state.orientation, state.camera)
        } else {
            (Matrix4::identity(), Camera::new())
        };

        ClockPrimitive {
            params: self.params,
            orientation,
            camera,
            projection,
            dial: Arc::clone(&self.dial),
        }
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if state.dragging {
            mouse::Interaction::Grabbing
        } else if cursor.is_over(bounds) {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::default()
        }
    }
}

impl ClockShaderProgram {
    /// Left drag rotates the clock, Shift-drag rolls it, the wheel zooms.
    fn handle_mouse_event(
        &self,
        state: &mut ClockShaderState,
        mouse_event: mouse::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> event::Status {
        match mouse_event {
            mouse::Event::CursorMoved { .. } => {
                let Some(position) = cursor.position_in(bounds) else {
                    state.last_cursor = None;
                    return event::Status::Ignored;
                };
                if let (true, Some(last)) = (state.dragging, state.last_cursor) {
                    let delta_x = position.x - last.x;
                    let delta_y = position.y - last.y;
                    state.orientation = if state.shift_pressed {
                        roll_rotation(&state.orientation, delta_x)
                    } else {
                        drag_rotation(&state.orientation, delta_x, delta_y)
                    };
                }
                state.last_cursor = Some(position);
                if state.dragging {
                    return event::Status::Captured;
                }
            }
            mouse::Event::ButtonPressed(mouse::Button::Left) => {
                if let Some(position) = cursor.position_in(bounds) {
                    state.dragging = true;
                    state.last_cursor = Some(position);
                    return event::Status::Captured;
                }
            }
            mouse::Event::ButtonReleased(mouse::Button::Left) => {
                if state.dragging {
                    state.dragging = false;
                    return event::Status::Captured;
                }
            }
            mouse::Event::CursorLeft => {
                // Key releases are not delivered while the window is unfocused.
                state.shift_pressed = false;
                state.last_cursor = None;
            }
            mouse::Event::WheelScrolled { delta } => {
                if cursor.position_in(bounds).is_some() {
                    let scroll_delta = match delta {
                        mouse::ScrollDelta::Lines { y, .. } => y,
                        mouse::ScrollDelta::Pixels { y, .. } => y * 0.01,
                    };
                    state.camera.zoom(scroll_delta);
                    return event::Status::Captured;
                }
            }
            _ => {}
        }

        event::Status::Ignored
    }

    fn handle_keyboard_event(
        &self,
        state: &mut ClockShaderState,
        keyboard_event: iced::keyboard::Event,
    ) -> event::Status {
        use iced::keyboard::Event;
        use iced::keyboard::{Key, key};
        match keyboard_event {
            Event::KeyPressed {
                key: Key::Named(key::Named::Shift),
                ..
            } => {
                state.shift_pressed = true;
            }
            Event::KeyReleased {
                key: Key::Named(key::Named::Shift),
                ..
            } => {
                state.shift_pressed = false;
            }
            Event::ModifiersChanged(modifiers) => {
                state.shift_pressed = modifiers.shift();
            }
            _ => {}
        }

        event::Status::Ignored
    }
}
