// All prompt and query templates for company context retrieval.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Deep research prompt template.
/// Replace: {company}, {role}, {uncertainty_instruction}
pub const DEEP_RESEARCH_PROMPT_TEMPLATE: &str = "以下の企業について、採用に関わる価値観・求める人物像・評価軸・事業の特徴を、\
一次情報または信頼できる情報に基づいて簡潔に整理してください。\
{uncertainty_instruction}\n\n\
企業名: {company}\n\
職種: {role}\n\
出力は日本語で、箇条書きを含む短いレポート形式にしてください。";

/// Keyword search query templates, issued in order.
/// Replace: {company}, {role}
pub const SEARCH_QUERY_TEMPLATES: &[&str] = &["{company} {role} 求める人物像 大切にしている価値観"];

/// Fixed query the search snippets are ranked against.
pub const RANKING_QUERY: &str = "採用 価値観 求める人物像";
