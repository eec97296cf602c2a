//! Prompts sent to the language models.
//!
//! Both prompts are fixed payloads: the page-transcription instruction is sent
//! verbatim with every rendered page, and the classification prompt only
//! varies by the resume text spliced into its tail. The rubric and output
//! schema are product data, so they are kept here as literals rather than
//! assembled from configuration.

/// Instruction sent alongside each rasterised page.
pub const OCR_PAGE_PROMPT: &str = "Extrae TODO el texto de esta página del CV:";

/// Extraction and classification instructions. The resume text is appended
/// after the final `---` marker by [`classification_prompt`].
pub const CLASSIFICATION_PROMPT: &str = r#"Eres un asistente experto en procesamiento de CVs. Tu tarea es extraer información de un CV y clasificar al candidato.

Instrucciones:
1. Extrae información general:
- nombre
- correo
- teléfono
- educación
- experiencia
- habilidades
- certificaciones
- idiomas
- cursos

2. Evalúa si el candidato es adecuado para el puesto:

Requisitos mínimos para ser candidato:
- Tener experiencia laboral mínima de 2 años en áreas administrativas, gestión o relacionadas con IA.
- Contar con al menos 1 certificación o curso en IA, administración o áreas afines.
- Mostrar nivel intermedio o avanzado en al menos 1 idioma (inglés preferente).
- Incluir al menos 3 habilidades técnicas o administrativas relevantes al puesto.

Skills específicos requeridos:
- Carreras afines:
  - Ingeniería en Sistemas Computacionales
  - Ingeniería en Desarrollo de Software
  - Ingeniería en Mecatrónica
  - Ingeniería en Ciencias de Datos
- Perfil:
  - Graduado o último semestre de la carrera
  - Experiencia en gestión de proyectos
  - Experiencia en lenguajes de programación (Python, JavaScript, Visual Basic, HTML, PHP)
  - Conocimiento en bases de datos
  - Conocimiento en IA
  - Inglés intermedio o avanzado
- Modalidad: Híbrida
- Disponibilidad: Tiempo completo

- Si cumple con lo anterior, "candidato": true.
- Si no cumple, "candidato": false y en "motivo_no_candidato" explica la razón principal.
- De los cursos encontrados en el CV, solo devuelve los 10 más relevantes al perfil buscado.

3. Devuelve todo en un JSON válido con esta estructura:

{
    "informacion_general": {
        "nombre": "",
        "correo": "",
        "teléfono": [],
        "educación": [],
        "experiencia": [],
        "habilidades": [],
        "certificaciones": [],
        "idiomas": []
    },
    "candidato": true,
    "motivo_no_candidato": ""
}

4. Si algún campo no existe, usa "" o [] según corresponda.
5. No agregues texto adicional, solo JSON válido.

Documento (CV):
---
"#;

/// Build the classification request for one resume.
pub fn classification_prompt(resume_text: &str) -> String {
    let mut prompt = String::with_capacity(CLASSIFICATION_PROMPT.len() + resume_text.len() + 1);
    prompt.push_str(CLASSIFICATION_PROMPT);
    prompt.push_str(resume_text);
    prompt.push('\n');
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_text_after_marker() {
        let p = classification_prompt("Juan Pérez\njuan@example.com");
        let (_, tail) = p.rsplit_once("---\n").expect("marker present");
        assert_eq!(tail, "Juan Pérez\njuan@example.com\n");
    }

    #[test]
    fn prompt_carries_rubric_and_schema() {
        let p = classification_prompt("");
        assert!(p.contains("mínima de 2 años"));
        assert!(p.contains("al menos 3 habilidades"));
        assert!(p.contains("Ingeniería en Ciencias de Datos"));
        assert!(p.contains("\"informacion_general\""));
        assert!(p.contains("\"motivo_no_candidato\""));
    }

    #[test]
    fn prompt_is_identical_across_requests() {
        assert_eq!(classification_prompt("x"), classification_prompt("x"));
    }
}
