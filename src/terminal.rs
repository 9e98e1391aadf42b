// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based camera viewer
//!
//! Renders the compositing surface to the terminal using Unicode half-block
//! characters for improved vertical resolution. Keyboard and mouse input are
//! mapped onto the [`App`] setter operations; the display tick, recorder and
//! input stream are all awaited from one `select!` loop.

use crate::app::{App, AppEvent, CameraMode, FocusPhase, Point};
use crate::render::TickOutcome;

use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use image::RgbaImage;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Clear, Paragraph, Widget, Wrap},
};
use std::io::{self, stdout};
use tokio::time::Instant;
use tracing::{info, warn};

/// Run the terminal camera viewer until the user quits
pub async fn run(mut app: App) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    app.shutdown().await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

/// Transient UI state that does not belong to the application context
#[derive(Default)]
struct Ui {
    status_message: Option<String>,
    show_help: bool,
    show_settings: bool,
}

enum Flow {
    Continue,
    Quit,
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    // A failure is shown as a blocking message instead of quitting
    if let Ok(()) = app.start_camera().await {
        info!(camera = app.camera_name().unwrap_or("unknown"), "Terminal viewer started");
    }

    let mut events = EventStream::new();
    let mut ui = Ui::default();
    let mut redraw = true;

    loop {
        if redraw {
            terminal.draw(|f| draw(f, &*app, &ui))?;
        }

        tokio::select! {
            event = app.step() => {
                redraw = on_app_event(event, &mut ui);
            }
            input = events.next() => {
                let Some(input) = input else { break };
                redraw = true;
                if let Flow::Quit = on_input(input?, app, &mut ui).await {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn on_app_event(event: AppEvent, ui: &mut Ui) -> bool {
    match event {
        AppEvent::Tick(TickOutcome::NotDue) | AppEvent::FrameRecorded => false,
        AppEvent::Tick(_) => true,
        AppEvent::RecordingFinalized { bytes } => {
            ui.status_message = Some(format!("Finalizing video ({} KiB)...", bytes / 1024));
            true
        }
        AppEvent::PhotoSaved(path) => {
            ui.status_message = Some(format!("Saved: {}", path.display()));
            true
        }
        AppEvent::RecordingSaved(path) => {
            ui.status_message = Some(format!("Saved: {}", path.display()));
            true
        }
        AppEvent::PhotoFailed(e) => {
            ui.status_message = Some(format!("Error: {}", e));
            true
        }
        AppEvent::RecordingFailed(e) => {
            ui.status_message = Some(format!("Error: {}", e));
            true
        }
    }
}

async fn on_input(event: Event, app: &mut App, ui: &mut Ui) -> Flow {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => on_key(key, app, ui).await,
        Event::Mouse(mouse) => {
            on_mouse(mouse, app);
            Flow::Continue
        }
        _ => Flow::Continue,
    }
}

async fn on_key(key: KeyEvent, app: &mut App, ui: &mut Ui) -> Flow {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Flow::Quit;
    }
    ui.status_message = None;

    // The blocking camera message only lets the user retry, switch or quit
    if app.error_message().is_some() {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
            KeyCode::Enter | KeyCode::Char(' ') => {
                let _ = app.start_camera().await;
            }
            KeyCode::Char('f') => {
                let _ = app.switch_facing().await;
            }
            _ => {}
        }
        return Flow::Continue;
    }

    match key.code {
        KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Esc => {
            if ui.show_settings || ui.show_help {
                ui.show_settings = false;
                ui.show_help = false;
            } else {
                return Flow::Quit;
            }
        }
        KeyCode::Char(' ') | KeyCode::Enter => {
            if let Err(e) = app.shutter() {
                warn!(error = %e, "Shutter failed");
                ui.status_message = Some(format!("Error: {}", e));
            }
        }
        KeyCode::Char('m') => {
            if !app.toggle_mode() {
                ui.status_message = Some("Stop recording to change mode".to_string());
            }
        }
        KeyCode::Char('f') => {
            if let Err(e) = app.switch_facing().await {
                ui.status_message = Some(format!("Error: {}", e));
            }
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            app.zoom_in();
        }
        KeyCode::Char('-') => {
            app.zoom_out();
        }
        KeyCode::Char('0') => app.reset_zoom(),
        KeyCode::Up => {
            app.exposure_up();
        }
        KeyCode::Down => {
            app.exposure_down();
        }
        KeyCode::Char('e') => app.reset_exposure(),
        KeyCode::Right => {
            app.next_filter();
        }
        KeyCode::Left => {
            app.prev_filter();
        }
        KeyCode::Char('o') => {
            ui.show_settings = !ui.show_settings;
            ui.show_help = false;
        }
        KeyCode::Char('h') => {
            ui.show_help = !ui.show_help;
            ui.show_settings = false;
        }
        KeyCode::Char('r') => {
            let next = app.config().target_fps.next();
            if let Err(e) = app.set_target_fps(next).await {
                ui.status_message = Some(format!("Error: {}", e));
            }
        }
        KeyCode::Char('z') => {
            let next = app.config().max_zoom.next();
            app.set_max_zoom(next);
        }
        KeyCode::Char('s') => {
            app.toggle_shutter_sound();
        }
        KeyCode::Char('p') => {
            let next = app.config().save_format.next();
            app.set_save_format(next);
        }
        KeyCode::Char('x') => {
            app.toggle_mirror_front();
        }
        _ => {}
    }
    Flow::Continue
}

fn on_mouse(mouse: MouseEvent, app: &mut App) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            app.tap_focus(Point::new(f32::from(mouse.column), f32::from(mouse.row)));
        }
        MouseEventKind::ScrollUp => {
            app.zoom_in();
        }
        MouseEventKind::ScrollDown => {
            app.zoom_out();
        }
        _ => {}
    }
}

fn draw(f: &mut Frame, app: &App, ui: &Ui) {
    let area = f.area();
    let now = Instant::now();

    // Reserve bottom line for status
    let camera_area = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height: area.height.saturating_sub(1),
    };
    let status_area = Rect {
        x: area.x,
        y: area.height.saturating_sub(1),
        width: area.width,
        height: 1,
    };

    let frame_widget = FrameWidget {
        image: app.surface().image(),
        flash: app.flash_active(now),
        focus: app.focus_phase(now),
    };
    f.render_widget(&frame_widget, camera_area);

    let message = match &ui.status_message {
        Some(message) => message.clone(),
        None => status_line(app),
    };
    f.render_widget(
        StatusBar {
            message: &message,
            recording: app.elapsed_label(),
        },
        status_area,
    );

    if let Some(error) = app.error_message() {
        let text = format!(
            "{}\n\nEnter: retry | f: switch camera | q: quit",
            error
        );
        render_popup(f, camera_area, " Camera unavailable ", &text, Color::Red);
    } else if ui.show_settings {
        render_popup(f, camera_area, " Settings ", &settings_text(app), Color::Gray);
    } else if ui.show_help {
        render_popup(f, camera_area, " Keys ", HELP_TEXT, Color::Gray);
    }
}

const HELP_TEXT: &str = "Space/Enter  capture or record\n\
m  photo/video mode\n\
f  switch camera\n\
+ - 0  zoom in/out/reset (or scroll)\n\
Up Down e  exposure up/down/reset\n\
Left Right  filter\n\
click  focus indicator\n\
o  settings\n\
q  quit";

fn status_line(app: &App) -> String {
    let view = app.view();
    format!(
        "{} | {} | {:.1}x | exp {:+.1} | {} | Space: {} | 'h' help",
        app.mode().display_name(),
        app.facing(),
        view.zoom(),
        view.exposure(),
        view.filter().display_name(),
        shutter_label(app.mode(), app.is_recording()),
    )
}

fn settings_text(app: &App) -> String {
    let config = app.config();
    let on_off = |v: bool| if v { "on" } else { "off" };
    format!(
        "r  frame rate     {}\n\
         z  max zoom       {}\n\
         p  save format    {}\n\
         s  shutter sound  {}\n\
         x  mirror front   {}\n\n\
         o/Esc  close",
        config.target_fps.display_name(),
        config.max_zoom.display_name(),
        config.save_format.display_name(),
        on_off(config.shutter_sound),
        on_off(config.mirror_front),
    )
}

fn render_popup(f: &mut Frame, area: Rect, title: &str, text: &str, border: Color) {
    let lines = text.lines().count() as u16;
    let width = area.width.saturating_sub(4).min(56);
    let height = (lines + 2).min(area.height);
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    };

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(text.to_string())
            .wrap(Wrap { trim: false })
            .block(
                Block::bordered()
                    .title(title.to_string())
                    .border_style(Style::default().fg(border)),
            ),
        popup,
    );
}

/// Widget that renders the compositing surface using half-block characters
struct FrameWidget<'a> {
    image: &'a RgbaImage,
    flash: bool,
    focus: FocusPhase,
}

impl Widget for &FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 || area.width == 0 || area.height == 0 {
            // Nothing composited yet - show placeholder
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        }

        // Calculate display dimensions maintaining aspect ratio
        // Each terminal cell displays 2 vertical pixels using half-blocks
        let frame_aspect = width as f64 / height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = width as f64 / display_width as f64;
        let y_scale = height as f64 / (display_height * 2) as f64;

        // Upper half (▀) is the fg colour, lower half the bg colour
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;
                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = ((tx as f64 * x_scale) as u32).min(width - 1);
                let src_y_top = ((ty as f64 * 2.0 * y_scale) as u32).min(height - 1);
                let src_y_bottom = (((ty as f64 * 2.0 + 1.0) * y_scale) as u32).min(height - 1);

                let top = sample_pixel(self.image, src_x, src_y_top, self.flash);
                let bottom = sample_pixel(self.image, src_x, src_y_bottom, self.flash);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }

        draw_focus_ring(self.focus, area, buf);
    }
}

fn sample_pixel(image: &RgbaImage, x: u32, y: u32, flash: bool) -> Color {
    let [r, g, b, _] = image.get_pixel(x, y).0;
    if flash {
        // Wash towards white
        let lift = |c: u8| c / 4 + 191;
        Color::Rgb(lift(r), lift(g), lift(b))
    } else {
        Color::Rgb(r, g, b)
    }
}

fn draw_focus_ring(phase: FocusPhase, area: Rect, buf: &mut Buffer) {
    let (at, opacity) = match phase {
        FocusPhase::Hidden => return,
        FocusPhase::Visible { at } => (at, 1.0),
        FocusPhase::Fading { at, opacity } => (at, opacity),
    };

    let level = (255.0 * opacity.clamp(0.0, 1.0)) as u8;
    let style = Style::default().fg(Color::Rgb(level, level, 0));
    let cx = at.x as u16;
    let cy = at.y as u16;

    let corners = [
        (cx.saturating_sub(2), cy.saturating_sub(1), '┌'),
        (cx + 2, cy.saturating_sub(1), '┐'),
        (cx.saturating_sub(2), cy + 1, '└'),
        (cx + 2, cy + 1, '┘'),
    ];
    for (x, y, ch) in corners {
        if x >= area.x
            && x < area.x + area.width
            && y >= area.y
            && y < area.y + area.height
            && let Some(cell) = buf.cell_mut((x, y))
        {
            cell.set_char(ch);
            cell.set_style(style);
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
    recording: Option<&'a str>,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let mut x = area.x;
        if let Some(label) = self.recording {
            let badge = format!(" ● REC {} ", label);
            buf.set_string(x, area.y, &badge, Style::default().fg(Color::White).bg(Color::Red));
            x += badge.chars().count() as u16 + 1;
        }

        let room = area.width.saturating_sub(x - area.x) as usize;
        let text: String = self.message.chars().take(room).collect();
        buf.set_string(
            x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}

/// Label shown for the capture button in the current mode
fn shutter_label(mode: CameraMode, recording: bool) -> &'static str {
    match (mode, recording) {
        (CameraMode::Photo, _) => "Capture",
        (CameraMode::Video, false) => "Record",
        (CameraMode::Video, true) => "Stop",
    }
}
