//! Fallback values used when a canonical field cannot be recovered

/// Record name when no title property has text
pub const UNNAMED_RECORD: &str = "Sin Nombre";

/// Record address when no address-like property has text
pub const UNKNOWN_ADDRESS: &str = "Dirección no especificada";

/// Agent of a record with no responsible person
pub const UNASSIGNED_AGENT: &str = "Sin Asignar";

/// Author of a history entry whose title property is empty
pub const SYSTEM_AGENT: &str = "Sistema";

/// History title when no contact-type property has a value
pub const DEFAULT_NOTE_TITLE: &str = "Nota";

/// Category assigned to workspace leads
pub const LEAD_CATEGORY: &str = "Otros";

/// Category assigned to workspace clients
pub const CLIENT_CATEGORY: &str = "Cliente";

/// Status of a newly created lead
pub const NEW_LEAD_STATUS: &str = "new";

/// Status of a newly created client
pub const ACTIVE_CLIENT_STATUS: &str = "active";

/// Support ticket title placeholder
pub const UNTITLED_TICKET: &str = "Sin Título";

/// Support ticket status placeholder
pub const OPEN_TICKET_STATUS: &str = "Abierto";

/// Name written to a text relation column when the related page has none
pub const UNKNOWN_CLIENT: &str = "Cliente Desconocido";

/// Class column assumed when a page has none
pub const CLASS_COLUMN: &str = "Clase";

/// Class column type assumed when a page has none
pub const CLASS_COLUMN_KIND: &str = "select";

// Column names used when creating record pages or when an update targets
// a field the page does not expose yet.
pub const NAME_COLUMN: &str = "Name";
pub const ADDRESS_COLUMN: &str = "Dirección";
pub const PHONE_COLUMN: &str = "Teléfono";
pub const WEBSITE_COLUMN: &str = "Website";
pub const AGENT_COLUMN: &str = "Responsable";

// Column names assumed for history databases whose schema lacks a match.
pub const HISTORY_TITLE_COLUMN: &str = "Asesor";
pub const HISTORY_RELATION_COLUMN: &str = "Cliente";
pub const HISTORY_CONTACT_COLUMN: &str = "Contacto";
pub const HISTORY_COMMENT_COLUMN: &str = "Comentario";
