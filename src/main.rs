mod config;
mod error;
mod models;
mod schedule;
mod ui;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{APP_DIR, Config};
use crate::error::{AgendaError, Result};
use crate::schedule::Schedule;
use crate::ui::{App, render};

/// 获取数据目录路径 (~/.local/share/agenda-consulta/)，日志写在这里
fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| AgendaError::Config("diretório de dados indisponível".into()))?
        .join(APP_DIR);

    fs::create_dir_all(&data_dir)?;

    Ok(data_dir)
}

/// 终端被界面占用，日志写入文件
fn init_logging(level: &str) -> Result<PathBuf> {
    let log_path = get_data_dir()?.join("agenda.log");
    let file = OpenOptions::new().create(true).append(true).open(&log_path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(log_path)
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Erro: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = Config::load()?;
    let log_path = init_logging(&config.log_level)?;
    info!(log = %log_path.display(), physicians = config.physicians.len(), "agenda iniciada");

    // 预约只保存在内存中
    let schedule = Schedule::new(config.physician_names());
    let mut app = App::new(schedule, &config)?;

    // 设置终端
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // 主循环
    let result = run_app(&mut terminal, &mut app);

    // 恢复终端
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("agenda encerrada");
    result.map_err(AgendaError::from)
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        if let crossterm::event::Event::Key(key) = crossterm::event::read()? {
            if key.kind == crossterm::event::KeyEventKind::Press && ui::handle_key_event(app, key.code) {
                break;
            }
        }
    }
    Ok(())
}
