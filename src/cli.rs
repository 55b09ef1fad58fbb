//! Interface de linha de comando do huntdesk baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] e flags globais
//! (--config, --state, --user, --verbose).

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, builder::BoolishValueParser};

/// huntdesk: acompanhamento da produção de puzzles de uma hunt.
#[derive(Debug, Parser)]
#[command(name = "huntdesk", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração (padrão: ./huntdesk.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Caminho do arquivo de estado; sobrescreve a configuração.
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Usuário que executa a ação (padrão: $USER).
    #[arg(long, short, global = true)]
    pub user: Option<String>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Lista todos os status na ordem de progresso.
    Statuses,

    /// Mostra o responsável e as transições oferecidas para um status.
    Transitions {
        /// Código do status (ex.: T, NF).
        code: String,
    },

    /// Cria um puzzle novo em "Initial idea".
    New {
        /// Nome do puzzle.
        name: String,
    },

    /// Muda o status de um puzzle.
    Status {
        id: u64,
        /// Código do status de destino.
        code: String,
        /// Falha se o puzzle não estiver mais neste status.
        #[arg(long)]
        expect: Option<String>,
    },

    /// Adiciona um comentário, opcionalmente mudando o status.
    Comment {
        id: u64,
        text: String,
        /// Código do novo status, se o comentário também muda o status.
        #[arg(long)]
        status: Option<String>,
    },

    /// Mostra o histórico de um puzzle.
    History { id: u64 },

    /// Reconstrói o status de um puzzle em um instante (RFC 3339).
    StatusAt { id: u64, at: String },

    /// Puzzles aguardando o usuário atual.
    Inbox,

    /// Contagem por status, tags importantes e gráfico de evolução.
    Stats {
        /// Janela do gráfico: alltime, <n>d, <n>w ou <n>m.
        #[arg(long, default_value = "alltime")]
        time: String,
    },

    /// Tempo gasto em cada status.
    Durations,

    /// Carga de puzzles por editor.
    Editors,

    /// Recalcula `status_mtime` a partir do histórico.
    Backfill,

    /// Inscreve o usuário para ser avisado quando um puzzle entrar em um status.
    Subscribe {
        code: String,
        /// Email para as notificações.
        #[arg(long)]
        email: Option<String>,
    },

    /// Sessões de testsolve.
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Abre uma sessão de testsolve para um puzzle.
    Open {
        puzzle: u64,
        /// Não anuncia a sessão para outros participantes.
        #[arg(long, default_value_t = false)]
        private: bool,
    },

    /// Entra em uma sessão.
    Join { session: u64 },

    /// Registra um palpite de resposta.
    Guess { session: u64, guess: String },

    /// Define se a sessão aceita novos participantes.
    Joinable {
        session: u64,
        #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
        joinable: bool,
    },
}
