//! 视图层模块
//!
//! 包含主渲染入口和各种视图组件

pub mod components;
pub mod layouts;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
};

use super::form::{ALL_FIELDS, FormField};
use super::state::{App, AppMode, ConfirmAction, Toggle};
use components::{render_dialog_framework, render_input_widget, render_toggle_button};
use layouts::centered_rect;

/// 渲染 UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // 标题
            Constraint::Length(3), // 医生选择
            Constraint::Min(8),    // 表格 + 按钮
            Constraint::Length(5), // 详情
            Constraint::Length(3), // 帮助
        ])
        .split(frame.area());

    render_title(frame, chunks[0]);
    render_physician_selector(frame, app, chunks[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(26)])
        .split(chunks[2]);
    render_table(frame, app, body[0]);
    render_buttons(frame, app, body[1]);

    render_details(frame, app, chunks[3]);
    render_help(frame, app, chunks[4]);

    // 渲染弹窗
    match &app.mode {
        AppMode::Booking => render_form_dialog(frame, app, "Marcar Consulta"),
        AppMode::Modifying(_) => render_form_dialog(frame, app, "Alterar Consulta"),
        AppMode::Confirm(action) => render_confirm_dialog(frame, app, action),
        AppMode::Normal => {}
    }
}

fn render_title(frame: &mut Frame, area: Rect) {
    let title = Paragraph::new("🩺 Agenda de Consultas")
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, area);
}

fn render_physician_selector(frame: &mut Frame, app: &App, area: Rect) {
    let names: Vec<&str> = app
        .schedule
        .physicians()
        .iter()
        .map(String::as_str)
        .collect();

    let title = format!(
        "Médico [h/l] · {} [[/]]",
        app.current_date.format("%d/%m/%Y")
    );
    let tabs = Tabs::new(names)
        .select(app.physician_index)
        .block(Block::default().title(title).borders(Borders::ALL))
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let rows: Vec<Row> = app
        .table_cells()
        .into_iter()
        .map(|[slot, patient]| Row::new(vec![slot, patient]))
        .collect();

    let header = Row::new(vec!["Horário/Consulta", "Paciente"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let table = Table::new(
        rows,
        [Constraint::Percentage(55), Constraint::Percentage(45)],
    )
    .header(header)
    .block(Block::default().title("Consultas").borders(Borders::ALL))
    .row_highlight_style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED),
    );

    // 占位空行不可选中
    let mut state = TableState::default();
    if !app.display_list.is_empty() {
        state.select(Some(app.selected_index));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_buttons(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let active = app.mode.active_toggle();
    for (toggle, chunk) in Toggle::ALL.iter().zip(chunks.iter()) {
        render_toggle_button(
            frame,
            *chunk,
            toggle.label(),
            toggle.key(),
            active == Some(*toggle),
        );
    }

    let slots: Vec<String> = app.free_slots().iter().map(ToString::to_string).collect();
    let text = if slots.is_empty() {
        "(nenhum)".to_string()
    } else {
        slots.join("\n")
    };
    let free = Paragraph::new(text)
        .style(Style::default().fg(Color::Green))
        .block(Block::default().title("Horários livres").borders(Borders::ALL));
    frame.render_widget(free, chunks[3]);
}

fn render_details(frame: &mut Frame, app: &App, area: Rect) {
    let content = match app.selected_appointment() {
        Some(appointment) => {
            let consultation = &appointment.consultation;
            let slot = match consultation.time_range() {
                Some(range) => format!("{} ({} min)", range, range.duration().num_minutes()),
                None => "avulsa".to_string(),
            };
            format!(
                "Código: {}  Paciente: {}  Tipo: {}  Status: {}\nHorário: {}\nDescrição: {}",
                consultation.code(),
                appointment.patient,
                appointment.visit_type.label(),
                appointment.status.label(),
                slot,
                if consultation.medical_description().is_empty() {
                    "(nenhuma)"
                } else {
                    consultation.medical_description()
                }
            )
        }
        None => "Nenhuma consulta para este médico neste dia, pressione 'b' para marcar".to_string(),
    };

    let details = Paragraph::new(content)
        .block(Block::default().title("Detalhes").borders(Borders::ALL))
        .wrap(Wrap { trim: true });

    frame.render_widget(details, area);
}

fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = match &app.mode {
        AppMode::Normal => {
            "[b] marcar [e] alterar [d] desmarcar [s] status [h/l] médico [[/]] dia [t] hoje [q] voltar"
        }
        AppMode::Booking | AppMode::Modifying(_) => {
            "[Enter] próximo/salvar  [Tab] campo  [Esc] cancelar"
        }
        AppMode::Confirm(_) => "[y] confirmar  [n] cancelar",
    };

    let message = app.message.as_deref().unwrap_or("");
    let text = if message.is_empty() {
        help_text.to_string()
    } else {
        format!("{}  |  {}", help_text, message)
    };

    let help = Paragraph::new(text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(help, area);
}

fn render_form_dialog(frame: &mut Frame, app: &App, title: &str) {
    let area = centered_rect(60, 80, frame.area());
    let inner = render_dialog_framework(frame, area, title);

    let mut constraints: Vec<Constraint> = ALL_FIELDS.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Min(1));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    let focused = app.form.focused();
    for (field, chunk) in ALL_FIELDS.iter().zip(chunks.iter()) {
        let color = if app.form.is_editable(*field) {
            Color::Yellow
        } else {
            Color::DarkGray
        };
        render_input_widget(
            frame,
            *chunk,
            field.label(),
            app.form.value(*field),
            *field == focused,
            color,
        );
    }

    // 校验错误显示在表单底部
    let hint = match (&app.message, focused) {
        (Some(message), _) => Paragraph::new(message.as_str()).style(Style::default().fg(Color::Red)),
        (None, FormField::Start | FormField::End) => {
            Paragraph::new("Deixe início e fim vazios para consulta avulsa")
                .style(Style::default().fg(Color::Gray))
        }
        (None, _) => Paragraph::new("Enter avança, no último campo salva")
            .style(Style::default().fg(Color::Gray)),
    };
    if let Some(last) = chunks.last() {
        frame.render_widget(hint.wrap(Wrap { trim: true }), *last);
    }
}

fn render_confirm_dialog(frame: &mut Frame, app: &App, action: &ConfirmAction) {
    let area = centered_rect(50, 20, frame.area());
    frame.render_widget(Clear, area);

    let message = match action {
        ConfirmAction::CancelAppointment(code) => {
            let patient = app
                .current_physician()
                .and_then(|physician| app.schedule.get(physician, code))
                .map(|a| a.patient.as_str())
                .unwrap_or("?");
            format!("Desmarcar a consulta {} ({})?", code, patient)
        }
    };

    let dialog = Paragraph::new(format!("{}\n\n[y] confirmar  [n] cancelar", message))
        .style(Style::default().fg(Color::Red))
        .block(Block::default().title("⚠️ Confirmar").borders(Borders::ALL));

    frame.render_widget(dialog, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{Appointment, Consultation};
    use crate::schedule::Schedule;
    use crate::ui::actions::Action;
    use ratatui::{Terminal, backend::TestBackend};

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 32)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_render_board() {
        let config = Config::default();
        let physician = config.physicians[0].clone();
        let mut app = App::new(Schedule::new(config.physician_names()), &config).unwrap();
        let date = app.current_date;
        app.schedule
            .book(
                &physician,
                Appointment::new(
                    Consultation::scheduled_from_str("C001", "08:00", "08:30").unwrap(),
                    "Ana",
                    date,
                ),
            )
            .unwrap();
        app.refresh_display_list();

        let text = screen_text(&app);
        assert!(text.contains("Paciente"));
        assert!(text.contains("C001"));
        assert!(text.contains("Marcar Consulta"));
        assert!(text.contains(&date.format("%d/%m/%Y").to_string()));
        assert!(text.contains("Horários livres"));
        assert!(text.contains("08:30–09:00"));
        assert!(text.contains("agendada"));
    }

    #[test]
    fn test_render_dialogs() {
        let config = Config::default();
        let mut app = App::new(Schedule::new(config.physician_names()), &config).unwrap();
        app.dispatch(Action::ToggleBook);
        assert!(screen_text(&app).contains("Paciente"));
        app.dispatch(Action::Dismiss);
        app.mode = AppMode::Confirm(ConfirmAction::CancelAppointment("C404".to_string()));
        assert!(screen_text(&app).contains("C404"));
    }
}
