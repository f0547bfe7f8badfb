//! Pure prompt builders for the three request kinds.
//!
//! Length ceilings for short-form document types are stated in the prompt only.
//! Nothing downstream truncates or rejects output that exceeds them.

use crate::models::{ActionRequest, ChatRequest, DocumentType, EvalRequest, GenerationRequest};

const MARKDOWN_GUIDE: &str = "Format your response using Markdown:
- Use # for main headings
- Use ## for subheadings
- Use **bold** for emphasis
- Use *italic* for subtle emphasis
- Use bullet points where appropriate
- Use numbered lists for sequential items
- Use > for quotes or important callouts";

const SHORT_FORM_GUIDE: &str = "Keep formatting minimal and appropriate for short-form content.";

pub fn format_prompt(request: &GenerationRequest) -> String {
    match request {
        GenerationRequest::Action(action) => format_action_prompt(action),
        GenerationRequest::Eval(eval) => format_eval_prompt(eval),
        GenerationRequest::Chat(chat) => format_chat_prompt(chat),
    }
}

fn document_type_guidance(document_type: &DocumentType) -> String {
    match document_type {
        DocumentType::Custom => String::new(),
        DocumentType::X => "
Document Type: X (Twitter)
STRICT REQUIREMENT: The response MUST be 280 characters or less.
Posts on X are extremely short. Use concise language and abbreviations where they read naturally.
Add one or two relevant hashtags only if space permits.
If the original content is too long, keep only its most impactful point."
            .to_string(),
        DocumentType::Threads => "
Document Type: Threads
STRICT REQUIREMENT: The response MUST be 500 characters or less.
Threads posts are concise and conversational, and may be one of a sequence of related posts.
Keep paragraphs very short and favour clarity and engagement over formal structure."
            .to_string(),
        DocumentType::LinkedIn => "
Document Type: LinkedIn
LinkedIn is a professional network, so keep the content business-appropriate.
Typical posts run one to three paragraphs; longer content needs clear formatting and headlines.
Focus on professional insight or industry trends, avoid overly promotional language,
and close with a call to action when it fits."
            .to_string(),
        DocumentType::Reddit => "
Document Type: Reddit
Reddit allows longer content. Format for readability with paragraphs, headers and bullet points.
Write in a conversational but clear voice that invites discussion.
Avoid marketing language; obvious promotion is poorly received."
            .to_string(),
        DocumentType::Blog => "
Document Type: Blog
Blog posts need clear sections, headers and an engaging flow.
Open with an attention-grabbing introduction, organise the body well and finish with a conclusion.
Vary sentence structure and use lists or quotes where they add value to the reader."
            .to_string(),
        DocumentType::Essay => "
Document Type: Essay
Essays are formal pieces with a clear thesis, supporting arguments and a conclusion.
Keep a logical flow with transitions between paragraphs and support claims with evidence or reasoning.
End with a conclusion that reinforces the thesis."
            .to_string(),
        DocumentType::Email => "
Document Type: Email
Emails should be clear and purposeful, with an appropriate greeting and sign-off.
Include a descriptive subject line and use short paragraphs or bullet points.
Be direct about any action needed from the recipient."
            .to_string(),
        DocumentType::Newsletter => "
Document Type: Newsletter
Newsletters should be scannable and valuable to subscribers.
Use a compelling subject line and clear sections with headers.
Balance informative content with storytelling and calls to action, keeping a consistent voice."
            .to_string(),
        DocumentType::Other(name) => format!(
            "
Document Type: {name}
This content is intended for {name}. Please adapt it appropriately for this platform or format,
following its typical style, length constraints and engagement patterns."
        ),
    }
}

fn length_warning(document_type: &DocumentType) -> String {
    if let Some(limit) = document_type.char_limit() {
        return format!(
            "
CRITICAL: THE LENGTH LIMIT IS {limit} CHARACTERS FOR {name} POSTS. COUNT YOUR CHARACTERS CAREFULLY.
Your ENTIRE output, including spaces and punctuation, MUST be {limit} characters or fewer.
If your draft exceeds this limit, condense it aggressively until it fits.
This is not a suggestion but a hard requirement.",
            name = document_type.name().to_uppercase(),
        );
    }

    match document_type {
        DocumentType::Email => "
For emails, aim for brevity and clarity. There is no strict character limit,
but effective emails usually run 50-125 words. Keep paragraphs to two or three sentences."
            .to_string(),
        _ => String::new(),
    }
}

pub fn format_action_prompt(request: &ActionRequest) -> String {
    let (guidance, warning, formatting_guide) = match &request.document_type {
        Some(document_type) => (
            document_type_guidance(document_type),
            length_warning(document_type),
            if document_type.is_short_form() {
                SHORT_FORM_GUIDE
            } else {
                MARKDOWN_GUIDE
            },
        ),
        None => (String::new(), String::new(), MARKDOWN_GUIDE),
    };

    format!(
        r#"As a writing assistant, please help modify the following text according to the specified requirements.

User Background:
{about_me}

Writing Preferences:
- Style: {style}
- Tone: {tone}
{guidance}

Task: {task}

Original Text:
{text}

{formatting_guide}
{warning}

Return ONLY the modified text with appropriate formatting. Do not include any other text, comments, or explanations."#,
        about_me = request.about_me,
        style = request.preferred_style,
        tone = request.tone,
        task = request.action_description,
        text = request.text,
    )
}

pub fn format_eval_prompt(request: &EvalRequest) -> String {
    format!(
        r#"As a writing assistant, please evaluate the following text based on the specified criteria.

Evaluation Criteria: {criteria}

Text to Evaluate:
{text}

Please provide a detailed evaluation of the text based on the specified criteria. Your evaluation should:
1. Start with a brief summary of your assessment
2. Include specific examples from the text to support your evaluation
3. Provide a numerical rating on a scale of 0-10 (where 0 is the worst and 10 is the best)
4. Offer constructive suggestions for improvement

IMPORTANT: You MUST include a clear numerical score between 0 and 10 in your evaluation.
Format it as "Rating: X/10" where X is the score.

Format your response using Markdown:
- Use **bold** for emphasis
- Use *italic* for subtle emphasis
- Use bullet points where appropriate
- Use > for important callouts

Return ONLY the evaluation with Markdown formatting. Do not include any other text, comments, or explanations."#,
        criteria = request.eval_description,
        text = request.text,
    )
}

pub fn format_chat_prompt(request: &ChatRequest) -> String {
    match request.context.as_deref().filter(|c| !c.is_empty()) {
        Some(context) => format!("{}\nContext: {}", request.message, context),
        None => request.message.clone(),
    }
}
