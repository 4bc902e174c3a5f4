//! Prompt construction for the content-generation operations.
//!
//! Every operation maps to one [`Prompt`]: a system instruction, a user message
//! built from the request, and the generation parameters the adapters forward.

use crate::{
    AnalyzeProcurementRequest, EvaluateBidRequest, GenerateContentRequest,
    GenerateTemplateRequest, ImproveContentRequest, SuggestFieldsRequest,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: &'static str,
    pub user: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Ask the provider for a bare JSON object.
    pub json: bool,
}

const CONTENT_SYSTEM: &str = "You are an expert procurement specialist with deep knowledge of \
RFx (RFQ, RFP, RFI) documents. Generate professional, clear and comprehensive content for \
RFx template fields. Respond in Turkish.";

const FIELDS_SYSTEM: &str = "You are a procurement consultant specializing in RFx template \
design. Suggest fields that make RFx documents more complete and effective. Respond only with \
JSON; field texts must be in Turkish.";

const IMPROVE_SYSTEM: &str = "You are a professional editor of procurement documents. Make the \
given content clearer, more professional and more complete while keeping its original intent. \
Respond in Turkish.";

const TEMPLATE_SYSTEM: &str = "You are a senior procurement strategist who designs RFx templates. \
Create comprehensive, well-structured templates. Respond only with valid JSON; texts must be in \
Turkish.";

const ANALYSIS_SYSTEM: &str = "You are an expert procurement analyst. Assess purchase requests \
for risk, sourcing options, budget and timeline. Respond only with valid JSON; texts must be in \
Turkish.";

const BID_SYSTEM: &str = "You are an impartial bid evaluator. Score supplier bids strictly \
against the given criteria and justify every score. Respond only with valid JSON; texts must be \
in Turkish.";

/// Rules appended to every chatbot system prompt.
pub const CHAT_SAFETY_RULES: &str = "CRITICAL SAFETY RULES:
1. You MUST stay strictly focused on procurement and purchasing tasks only
2. Reject any non-procurement related questions politely
3. Always maintain professional tone and language
4. Never provide information outside procurement context
5. Focus exclusively on helping with the current procurement request
6. Do not engage in general conversation or off-topic discussions
7. Always respond in the language used by the user (Turkish or English)";

pub fn content(req: &GenerateContentRequest) -> Prompt {
    let mut user = format!(
        "Generate content for the \"{}\" field of a {} document.\nCategory: {}\n",
        req.field_label, req.rfx_type, req.category
    );
    if let Some(desc) = &req.field_description {
        user.push_str(&format!("Field description: {desc}\n"));
    }
    if let Some(ctx) = &req.company_context {
        user.push_str(&format!("Company context: {ctx}\n"));
    }
    if let Some(ctx) = &req.procurement_context {
        user.push_str(&format!("Procurement context: {ctx}\n"));
    }
    user.push_str("\nThe content must be professional, detailed and ready to paste into the document.");

    Prompt {
        system: CONTENT_SYSTEM,
        user,
        temperature: 0.7,
        max_tokens: 500,
        json: false,
    }
}

pub fn field_suggestions(req: &SuggestFieldsRequest) -> Prompt {
    let mut user = format!(
        "Suggest 3-5 new fields for the \"{}\" section.\nRFx type: {}\nCategory: {}\n",
        req.section_title, req.rfx_type, req.category
    );
    if let Some(industry) = &req.industry {
        user.push_str(&format!("Industry: {industry}\n"));
    }
    user.push_str("Existing fields:\n");
    for field in &req.existing_fields {
        user.push_str(&format!("- {field}\n"));
    }
    user.push_str(
        "\nDo not repeat existing fields. Answer with this JSON structure:\n\
         {\"suggestions\": [{\"label\": \"...\", \"description\": \"...\", \
         \"isRequired\": true, \"reasoning\": \"...\"}]}",
    );

    Prompt {
        system: FIELDS_SYSTEM,
        user,
        temperature: 0.6,
        max_tokens: 800,
        json: true,
    }
}

pub fn improve(req: &ImproveContentRequest) -> Prompt {
    let mut user = format!(
        "Improve the following content of the \"{}\" field of a {} document.\n\nCurrent content:\n{}\n\n",
        req.field_label, req.rfx_type, req.current_content
    );
    user.push_str("Focus on:\n");
    if req.improvements.is_empty() {
        user.push_str("- Clarity\n- Completeness\n- Professional tone\n");
    } else {
        for item in &req.improvements {
            user.push_str(&format!("- {item}\n"));
        }
    }
    user.push_str("\nReturn only the improved text.");

    Prompt {
        system: IMPROVE_SYSTEM,
        user,
        temperature: 0.5,
        max_tokens: 600,
        json: false,
    }
}

pub fn template(req: &GenerateTemplateRequest) -> Prompt {
    let mut user = format!(
        "Create a {} template ({}).\nCategory: {}\nDescription: {}\n",
        req.rfx_type,
        req.rfx_type.description(),
        req.category,
        req.description
    );
    if !req.specific_requirements.is_empty() {
        user.push_str("Specific requirements:\n");
        for r in &req.specific_requirements {
            user.push_str(&format!("- {r}\n"));
        }
    }
    user.push_str(
        "\nReturn a JSON object with \"name\", \"description\" and \"sections\"; every section \
         has a \"title\" and \"fields\" with \"label\", \"description\" and \"isRequired\".",
    );

    Prompt {
        system: TEMPLATE_SYSTEM,
        user,
        temperature: 0.7,
        max_tokens: 2000,
        json: true,
    }
}

pub fn procurement_analysis(req: &AnalyzeProcurementRequest) -> Prompt {
    let mut user = format!(
        "Analyze the following procurement request.\n\nItem: {}\nQuantity: {} {}\nDescription: {}\n",
        req.item_title, req.quantity, req.uom, req.simple_definition
    );
    if let Some(justification) = &req.justification {
        user.push_str(&format!("Justification: {justification}\n"));
    }
    if !req.technical_specs.is_null() {
        user.push_str(&format!("Technical specs: {}\n", req.technical_specs));
    }
    user.push_str(
        "\nAnswer with a JSON object with \"riskAssessment\", \"supplierCategories\", \
         \"budgetEstimate\", \"timeline\" and \"evaluationCriteria\".",
    );

    Prompt {
        system: ANALYSIS_SYSTEM,
        user,
        temperature: 0.7,
        max_tokens: 1500,
        json: true,
    }
}

pub fn bid_evaluation(req: &EvaluateBidRequest) -> Prompt {
    let user = format!(
        "Evaluate the following supplier bid against the given criteria.\n\n\
         Bid details:\n{}\n\nEvaluation criteria:\n{}\n\n\
         Answer with a JSON object with \"scores\" (one entry per criterion with \"criteria\", \
         \"score\" and \"comment\"), \"overallScore\", \"strengths\", \"weaknesses\" and \
         \"recommendation\".",
        req.bid, req.criteria
    );

    Prompt {
        system: BID_SYSTEM,
        user,
        temperature: 0.7,
        max_tokens: 1500,
        json: true,
    }
}
