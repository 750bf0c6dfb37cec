// All LLM prompt templates for the transform module, plus the helpers that
// fill them. Templates are plain text; placeholders are `{name}`.

/// Maximum number of characters of page content sent to the model.
/// Anything beyond is dropped without notice.
pub const MAX_SOURCE_CHARS: usize = 50_000;

/// Adapt variant: rewrite the supplied CV against the posting.
/// Replace: {page_content}, {cv_content}
pub const ADAPT_CV_PROMPT_TEMPLATE: &str = r#"You are an expert CV/resume writer. I will provide you with the HTML content of a job posting page and an existing CV. Please adapt the CV to better match the job requirements found in the page content.

Page HTML Content:
{page_content}

Current CV:
{cv_content}

Please analyze the job posting from the HTML content and adapt the CV to:
1. Highlight relevant skills and experience that match the job requirements
2. Use keywords and terminology from the job posting
3. Emphasize achievements and experience that align with the role
4. Maintain a professional tone and structure
5. Focus on the most relevant aspects for this specific position

Provide the adapted CV in a clear, well-formatted structure."#;

/// Generate variant: no CV supplied, produce a template for the posting.
/// Replace: {page_content}
pub const GENERATE_CV_PROMPT_TEMPLATE: &str = r#"You are an expert CV/resume writer. I will provide you with the HTML content of a job posting page. Please create a CV template that would be well-suited for this job.

Page HTML Content:
{page_content}

Please analyze the job posting from the HTML content and create a CV template that:
1. Highlights the key skills and experience mentioned in the job posting
2. Uses appropriate keywords and terminology from the job description
3. Includes relevant sections (Summary, Experience, Skills, Education, etc.)
4. Focuses on the most important requirements for this role
5. Maintains a professional structure and format

Provide a comprehensive CV template that would be ideal for this position."#;

/// Cover letter. Replace: {page_content}
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"You are an expert cover letter writer. I will provide you with the HTML content of a job posting page. Please write a concise, professional cover letter for this position.

Page HTML Content:
{page_content}

Please write a cover letter that:
1. Is 150-200 words maximum
2. Uses simple, clear language
3. Shows enthusiasm for the specific role
4. Mentions 1-2 relevant skills or experiences
5. Has basic formatting only (paragraphs, no fancy styling)
6. Is professional but not overly formal
7. Focuses on why you're interested in this specific position

Write a brief, compelling cover letter that gets straight to the point."#;

/// Which CV prompt a call used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvPromptVariant {
    Adapt,
    Generate,
}

/// Returns the first `max_chars` characters of `text` and whether anything was cut.
/// Never splits a multi-byte character.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

/// Fills `{name}` placeholders in a single left-to-right pass.
///
/// Substituted values are copied verbatim and never rescanned, so page content
/// that contains `{cv_content}` cannot pull the CV into the page slot.
/// Unknown placeholders are left as-is.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let capacity = template.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>();
    let mut out = String::with_capacity(capacity);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let substituted = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });

        match substituted {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Builds the CV prompt. An absent or empty `cv_content` selects the generate variant.
pub fn build_cv_prompt(page_content: &str, cv_content: Option<&str>) -> (String, CvPromptVariant) {
    match cv_content.filter(|cv| !cv.is_empty()) {
        Some(cv) => (
            render_template(
                ADAPT_CV_PROMPT_TEMPLATE,
                &[("page_content", page_content), ("cv_content", cv)],
            ),
            CvPromptVariant::Adapt,
        ),
        None => (
            render_template(
                GENERATE_CV_PROMPT_TEMPLATE,
                &[("page_content", page_content)],
            ),
            CvPromptVariant::Generate,
        ),
    }
}

pub fn build_cover_letter_prompt(page_content: &str) -> String {
    render_template(
        COVER_LETTER_PROMPT_TEMPLATE,
        &[("page_content", page_content)],
    )
}
