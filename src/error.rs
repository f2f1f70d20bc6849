//! 错误类型
//!
//! 表单校验类错误可以在界面上提示后重新输入；配置/IO 类错误只在启动时出现。

use chrono::NaiveTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgendaError {
    /// 时间格式无法解析
    #[error("Horário inválido: '{0}' (use HH:MM)")]
    InvalidTime(String),

    /// 开始时间不早于结束时间
    #[error("O início ({start}) deve ser anterior ao fim ({end})")]
    InvalidRange { start: NaiveTime, end: NaiveTime },

    /// 时间段只填了一端，参数为缺少的字段名
    #[error("Informe o horário de {0} (ou deixe início e fim vazios para consulta avulsa)")]
    MissingTime(&'static str),

    #[error("Tipo de consulta inválido: '{0}' (normal, retorno, emergência ou exame)")]
    InvalidVisitType(String),

    #[error("Informe o código da consulta")]
    MissingCode,

    #[error("Informe o nome do paciente")]
    MissingPatient,

    /// 对随到随诊（无时间段）的咨询设置时间
    #[error("A consulta {0} é avulsa e não tem horário")]
    NotScheduled(String),

    #[error("Consulta {0} não encontrada")]
    NotFound(String),

    #[error("A consulta {0} já está finalizada")]
    AlreadyFinished(String),

    #[error("Já existe uma consulta com o código {0}")]
    DuplicateCode(String),

    /// 与同一医生已有的预约时间重叠
    #[error("Conflito de horário: {code} sobrepõe {existing}")]
    Conflict { code: String, existing: String },

    #[error("Médico desconhecido: {0}")]
    UnknownPhysician(String),

    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("Arquivo de configuração inválido: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Falha de arquivo: {0}")]
    Io(#[from] std::io::Error),
}

impl AgendaError {
    /// 是否可以通过重新输入来恢复
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            AgendaError::Config(_) | AgendaError::Toml(_) | AgendaError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AgendaError>;
