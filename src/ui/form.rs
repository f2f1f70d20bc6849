//! 预约表单
//!
//! 新预约时所有字段可编辑；修改预约时只能改时间段、类型和描述。

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::error::{AgendaError, Result};
use crate::models::{
    Appointment, Consultation, ConsultationKind, TimeRange, VisitType, parse_time,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Code,
    Patient,
    Start,
    End,
    VisitType,
    Description,
}

impl FormField {
    pub fn label(&self) -> &'static str {
        match self {
            FormField::Code => "Código",
            FormField::Patient => "Paciente",
            FormField::Start => "Início (HH:MM, vazio = avulsa)",
            FormField::End => "Fim (HH:MM)",
            FormField::VisitType => "Tipo (normal, retorno, emergência, exame)",
            FormField::Description => "Descrição médica (opcional)",
        }
    }
}

const BOOKING_FIELDS: &[FormField] = &[
    FormField::Code,
    FormField::Patient,
    FormField::Start,
    FormField::End,
    FormField::VisitType,
    FormField::Description,
];

const MODIFY_FIELDS: &[FormField] = &[
    FormField::Start,
    FormField::End,
    FormField::VisitType,
    FormField::Description,
];

pub const ALL_FIELDS: &[FormField] = BOOKING_FIELDS;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentForm {
    pub code: String,
    pub patient: String,
    pub start: String,
    pub end: String,
    pub visit_type: String,
    pub description: String,
    pub focus: usize,
    editing: bool,
}

fn format_time(t: Option<NaiveTime>) -> String {
    t.map(|t| t.format("%H:%M").to_string()).unwrap_or_default()
}

impl AppointmentForm {
    pub fn for_booking(code: String) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    /// 用已有预约预填
    pub fn for_modify(appointment: &Appointment) -> Self {
        let consultation = &appointment.consultation;
        Self {
            code: consultation.code().to_string(),
            patient: appointment.patient.clone(),
            start: format_time(consultation.start_time()),
            end: format_time(consultation.end_time()),
            visit_type: appointment.visit_type.label().to_string(),
            description: consultation.medical_description().to_string(),
            focus: 0,
            editing: true,
        }
    }

    pub fn fields(&self) -> &'static [FormField] {
        if self.editing {
            MODIFY_FIELDS
        } else {
            BOOKING_FIELDS
        }
    }

    pub fn is_editable(&self, field: FormField) -> bool {
        self.fields().contains(&field)
    }

    pub fn focused(&self) -> FormField {
        let fields = self.fields();
        fields[self.focus.min(fields.len() - 1)]
    }

    pub fn is_last_field(&self) -> bool {
        self.focus + 1 >= self.fields().len()
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields().len();
    }

    pub fn previous_field(&mut self) {
        let len = self.fields().len();
        self.focus = (self.focus + len - 1) % len;
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Code => &self.code,
            FormField::Patient => &self.patient,
            FormField::Start => &self.start,
            FormField::End => &self.end,
            FormField::VisitType => &self.visit_type,
            FormField::Description => &self.description,
        }
    }

    fn value_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Code => &mut self.code,
            FormField::Patient => &mut self.patient,
            FormField::Start => &mut self.start,
            FormField::End => &mut self.end,
            FormField::VisitType => &mut self.visit_type,
            FormField::Description => &mut self.description,
        }
    }

    pub fn push_char(&mut self, c: char) {
        let field = self.focused();
        self.value_mut(field).push(c);
    }

    pub fn pop_char(&mut self) {
        let field = self.focused();
        self.value_mut(field).pop();
    }

    /// 用空闲时段填充开始和结束时间
    pub fn fill_slot(&mut self, slot: TimeRange) {
        self.start = format_time(Some(slot.start()));
        self.end = format_time(Some(slot.end()));
    }

    /// 离开开始时间字段时，若结束时间为空则按默认时长补上
    pub fn fill_end_from_start(&mut self, minutes: u32) {
        if !self.end.trim().is_empty() {
            return;
        }
        if let Ok(start) = parse_time(&self.start) {
            let (end, wrapped) = start.overflowing_add_signed(Duration::minutes(i64::from(minutes)));
            if wrapped == 0 {
                self.end = end.format("%H:%M").to_string();
            }
        }
    }

    /// 开始和结束都为空表示随诊；只填一端时指出缺少的字段
    pub fn kind(&self) -> Result<ConsultationKind> {
        match (self.start.trim().is_empty(), self.end.trim().is_empty()) {
            (true, true) => Ok(ConsultationKind::OnDemand),
            (true, false) => Err(AgendaError::MissingTime("início")),
            (false, true) => Err(AgendaError::MissingTime("fim")),
            (false, false) => Ok(ConsultationKind::Scheduled(TimeRange::parse(
                &self.start,
                &self.end,
            )?)),
        }
    }

    pub fn parsed_visit_type(&self) -> Result<VisitType> {
        self.visit_type.parse()
    }

    pub fn to_appointment(&self, date: NaiveDate) -> Result<Appointment> {
        let mut consultation = match self.kind()? {
            ConsultationKind::Scheduled(range) => {
                Consultation::scheduled(self.code.clone(), range.start(), range.end())?
            }
            ConsultationKind::OnDemand => Consultation::on_demand(self.code.clone()),
        };
        consultation.set_medical_description(self.description.trim());
        Ok(Appointment::new(consultation, self.patient.clone(), date)
            .with_visit_type(self.parsed_visit_type()?))
    }
}
