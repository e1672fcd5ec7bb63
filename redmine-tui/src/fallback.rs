//! Local replies shown when the assistant server cannot be reached.
//!
//! The reply is picked by the first matching keyword group, in order.

const TICKETS: &str = "Cuando el servidor vuelva a estar disponible puedo ayudarte con tus tickets: \
estado, prioridad o a quién están asignados.";
const PROJECTS: &str = "Cuando el servidor vuelva a estar disponible puedo listar los proyectos \
y mostrar sus tickets, filtrados por estado o prioridad.";
const STATUS: &str = "Cuando el servidor vuelva a estar disponible puedo mostrarte el estado \
de los tickets de un proyecto.";
const USERS: &str = "Cuando el servidor vuelva a estar disponible puedo buscar usuarios y \
mostrar las tareas asignadas a cada uno.";
const HELP: &str = "Puedo ayudarte con:\n- Buscar usuarios y sus proyectos\n- Ver los tickets de un proyecto\n- Filtrar tickets por estado o prioridad\n- Mostrar tus tareas asignadas";

/// Keyword-based reply for `input`, matched case-insensitively.
pub fn fallback_reply(input: &str) -> String {
    let lower = input.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if has(&["ticket", "issue"]) {
        TICKETS.to_string()
    } else if has(&["project", "proyecto"]) {
        PROJECTS.to_string()
    } else if has(&["status", "progress", "estado"]) {
        STATUS.to_string()
    } else if has(&["user", "assign", "usuario", "asign"]) {
        USERS.to_string()
    } else if has(&["help", "ayuda"]) {
        HELP.to_string()
    } else {
        format!(
            "Entiendo que preguntas por '{}', pero no puedo conectar con el asistente ahora mismo. \
Inténtalo de nuevo más tarde.",
            input.trim()
        )
    }
}
