pub const COLLECT_PATH: &str = "/collect";
pub const FINGERPRINT_SCRIPT_PATH: &str = "/fingerprint.js";
pub const VIEW_PATH: &str = "/view";

pub const COLLECT_ACK_MESSAGE: &str = "Fingerprint salvo";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Método não permitido";
pub const UNAUTHORIZED_MESSAGE: &str = "Não autorizado";
pub const ROUTE_NOT_FOUND_MESSAGE: &str = "Rota não encontrada";
pub const MALFORMED_PAYLOAD_MESSAGE: &str = "JSON inválido";
pub const INTERNAL_ERROR_MESSAGE: &str = "Erro interno";
pub const QUEUE_FULL_MESSAGE: &str = "Serviço indisponível";

/// Browser-side collector served at [`FINGERPRINT_SCRIPT_PATH`].
pub const FINGERPRINT_SCRIPT: &str = include_str!("../assets/fingerprint.js");
