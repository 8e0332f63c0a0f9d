use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, ModifiersState, PhysicalKey},
    window::{Window, WindowId},
};

use crate::gpu::Presenter;
use crate::session::Session;
use crate::settings::{SETTINGS_FILE, Settings};
use crate::surface::RasterSurface;

struct Shell {
    window: Arc<Window>,
    presenter: Presenter,
    session: Session,
    surface: RasterSurface,
    cursor: (i32, i32),
    modifiers: ModifiersState,
}

impl Shell {
    fn report(&self, status: &str) {
        self.window
            .set_title(&format!("{} - {}", self.session.settings().title, status));
    }

    fn save(&mut self) {
        let path = self.session.settings().document_path.clone();
        match self.session.request_save(Some(path.as_path())) {
            Ok(()) => self.report(&format!("saved {}", path.display())),
            Err(e) => {
                log::error!("{:#}", anyhow::Error::from(e));
                self.report("save failed");
            }
        }
    }

    fn load(&mut self) {
        let path = self.session.settings().document_path.clone();
        match self.session.request_load(Some(path.as_path()), &mut self.surface) {
            Ok(()) => self.report(&format!("loaded {}", path.display())),
            Err(e) => {
                log::error!("{:#}", anyhow::Error::from(e));
                self.report("load failed");
            }
        }
    }

    fn export(&mut self) {
        let path = self.session.settings().export_path.clone();
        match self.surface.export_png(&path) {
            Ok(()) => self.report(&format!("exported {}", path.display())),
            Err(e) => {
                log::error!("{:#}", anyhow::Error::from(e));
                self.report("export failed");
            }
        }
    }

    fn report_tool(&self) {
        let tool = if self.session.eraser_on() {
            "eraser".to_string()
        } else {
            self.session.color().to_string()
        };
        self.report(&format!("{} {}px", tool, self.session.width()));
    }

    // Returns true if the event was consumed
    fn input(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
                false
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let (x, y) = self.cursor;
                match state {
                    ElementState::Pressed => self.session.pointer_down(x, y),
                    ElementState::Released => self.session.pointer_up(x, y),
                }
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x.round() as i32, position.y.round() as i32);
                let (x, y) = self.cursor;
                self.session.pointer_move(x, y, &mut self.surface) > 0
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        ..
                    },
                ..
            } => self.handle_key(*code),
            _ => false,
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> bool {
        let is_ctrl_or_cmd = self.modifiers.control_key() || self.modifiers.super_key();

        let palette_index = match code {
            KeyCode::Digit1 => Some(0),
            KeyCode::Digit2 => Some(1),
            KeyCode::Digit3 => Some(2),
            KeyCode::Digit4 => Some(3),
            KeyCode::Digit5 => Some(4),
            _ => None,
        };
        if let Some(index) = palette_index {
            let Some(color) = self.session.settings().palette.get(index).cloned() else {
                return false;
            };
            self.session.set_color(color);
            self.report_tool();
            return true;
        }

        match code {
            KeyCode::KeyS if is_ctrl_or_cmd => self.save(),
            KeyCode::KeyO if is_ctrl_or_cmd => self.load(),
            KeyCode::KeyP if is_ctrl_or_cmd => self.export(),
            KeyCode::KeyE => {
                self.session.toggle_eraser();
                self.report_tool();
            }
            KeyCode::KeyF => {
                self.session.toggle_fill();
                self.report_tool();
            }
            KeyCode::BracketLeft => {
                self.session.set_width(self.session.width().saturating_sub(1));
                self.report_tool();
            }
            KeyCode::BracketRight => {
                self.session.set_width(self.session.width().saturating_add(1));
                self.report_tool();
            }
            _ => return false,
        }
        true
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.presenter.resize(new_size);
        let size = self.presenter.size();
        self.surface.resize(size.width, size.height);
        self.session.replay(&mut self.surface);
    }

    fn redraw(&mut self) -> Result<(), wgpu::SurfaceError> {
        if self.surface.take_dirty() {
            self.presenter.upload(&self.surface);
        }
        self.presenter.render()
    }
}

struct App {
    settings: Settings,
    shell: Option<Shell>,
}

impl App {
    fn create_shell(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Shell> {
        let [width, height] = self.settings.canvas_size;
        let window_attributes = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(LogicalSize::new(width, height));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("creating window")?,
        );

        let presenter = pollster::block_on(Presenter::new(window.clone()))?;
        let session = Session::new(self.settings.clone());
        let size = presenter.size();
        let mut surface = session.new_surface();
        surface.resize(size.width, size.height);

        Ok(Shell {
            window,
            presenter,
            session,
            surface,
            cursor: (0, 0),
            modifiers: ModifiersState::empty(),
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.shell.is_none() {
            match self.create_shell(event_loop) {
                Ok(shell) => {
                    shell.window.request_redraw();
                    self.shell = Some(shell);
                }
                Err(e) => {
                    log::error!("Could not start: {:#}", e);
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(shell) = &mut self.shell else {
            return;
        };
        if window_id != shell.window.id() {
            return;
        }

        if shell.input(&event) {
            shell.window.request_redraw();
            return;
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(physical_size) => {
                log::info!("WindowEvent::Resized: {}x{}", physical_size.width, physical_size.height);
                shell.resize(physical_size);
                shell.window.request_redraw();
            }
            WindowEvent::RedrawRequested => match shell.redraw() {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let size = shell.presenter.size();
                    shell.presenter.resize(size);
                    shell.window.request_redraw();
                }
                Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                Err(e) => log::warn!("{:?}", e),
            },
            _ => {}
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    env_logger::init();

    let settings = Settings::load_or_default(Path::new(SETTINGS_FILE));
    let event_loop = EventLoop::new().context("creating event loop")?;
    let mut app = App {
        settings,
        shell: None,
    };

    event_loop.run_app(&mut app).context("running event loop")?;
    Ok(())
}
