//! Configuração do huntdesk carregada a partir de `huntdesk.toml`.
//!
//! A struct [`HuntdeskConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `HUNTDESK_STATE` tem precedência sobre `state_path`.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{HuntdeskError, Result};
use crate::stats::{DEFAULT_CHART_EXCLUDED, DEFAULT_NON_SCHEDULE_TAGS};
use crate::workflow::{RuleSpec, Status, TransitionMode, TransitionTable, WorkflowEngine};

/// Nome do arquivo de configuração procurado no diretório atual.
pub const CONFIG_FILE: &str = "huntdesk.toml";

/// Variável de ambiente que sobrescreve o caminho do estado.
pub const STATE_ENV: &str = "HUNTDESK_STATE";

/// Configuração de nível superior carregada de `huntdesk.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct HuntdeskConfig {
    /// Caminho do arquivo JSON com puzzles, histórico e sessões.
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    /// Como tratar transições que a tabela não oferece.
    #[serde(default)]
    pub transition_mode: TransitionMode,

    /// Códigos de status omitidos do gráfico de evolução.
    #[serde(default = "default_chart_excluded")]
    pub chart_excluded: Vec<String>,

    /// Tags fora do cronograma normal de puzzles.
    #[serde(default = "default_non_schedule_tags")]
    pub non_schedule_tags: Vec<String>,

    /// Tags exibidas como colunas próprias nas estatísticas.
    #[serde(default)]
    pub important_tags: Vec<String>,

    /// Meta de puzzles exibida como linha no gráfico.
    #[serde(default)]
    pub target_puzzle_count: Option<u32>,

    /// Tabela de transições customizada.
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

/// Seção `[workflow]`: substitui a tabela de transições padrão quando
/// `rules` não está vazia.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

// Valor padrão para o arquivo de estado: "huntdesk.json".
fn default_state_path() -> PathBuf {
    PathBuf::from("huntdesk.json")
}

// Dead, deferred e initial idea ficam fora do gráfico.
fn default_chart_excluded() -> Vec<String> {
    DEFAULT_CHART_EXCLUDED
        .iter()
        .map(|s| s.code().to_string())
        .collect()
}

// meta, navigation e event.
fn default_non_schedule_tags() -> Vec<String> {
    DEFAULT_NON_SCHEDULE_TAGS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for HuntdeskConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            transition_mode: TransitionMode::default(),
            chart_excluded: default_chart_excluded(),
            non_schedule_tags: default_non_schedule_tags(),
            important_tags: Vec::new(),
            target_puzzle_count: None,
            workflow: WorkflowConfig::default(),
        }
    }
}

impl HuntdeskConfig {
    /// Carrega a configuração de `path`, ou de `huntdesk.toml` no diretório
    /// atual. Usa valores padrão se o arquivo não existir.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(CONFIG_FILE));
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Self::parse(&contents)?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo de configuração.
        config.apply_state_override(std::env::var(STATE_ENV).ok());
        Ok(config)
    }

    /// Interpreta e valida o conteúdo TOML.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: HuntdeskConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Aplica o valor de `HUNTDESK_STATE`, ignorando valores vazios.
    pub fn apply_state_override(&mut self, value: Option<String>) {
        if let Some(path) = value.filter(|p| !p.is_empty()) {
            self.state_path = PathBuf::from(path);
        }
    }

    /// Garante que todo código citado existe no registro de status.
    pub fn validate(&self) -> Result<()> {
        self.chart_excluded_statuses()?;
        self.transition_table()?;
        Ok(())
    }

    pub fn chart_excluded_statuses(&self) -> Result<Vec<Status>> {
        self.chart_excluded
            .iter()
            .map(|code| {
                code.parse::<Status>().map_err(|_| {
                    HuntdeskError::Config(format!("chart_excluded: unknown status code {code:?}"))
                })
            })
            .collect()
    }

    /// A tabela padrão, ou a definida em `[workflow]`.
    pub fn transition_table(&self) -> Result<TransitionTable> {
        if self.workflow.rules.is_empty() {
            return Ok(TransitionTable::default());
        }
        TransitionTable::from_specs(&self.workflow.rules)
    }

    /// Monta o motor de workflow com a tabela e o modo configurados.
    pub fn engine(&self) -> Result<WorkflowEngine> {
        Ok(WorkflowEngine::new(
            self.transition_table()?,
            self.transition_mode,
        ))
    }
}
