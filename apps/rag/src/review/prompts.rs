// All LLM prompt constants for the review pipeline.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for the first agent.
pub const RESEARCHER_SYSTEM: &str = "You are a Company Researcher. \
    Goal: Extract company hiring signals and values from search results. \
    Backstory: You summarize key hiring signals for job applicants.";

/// Researcher task template.
/// Replace: {company}, {role}, {context}
pub const RESEARCHER_PROMPT_TEMPLATE: &str = "Use the context to extract the company's core hiring signals. \
Return concise bullet keywords only.

Company: {company}
Role: {role}
Context:
{context}
";

/// System prompt for the second agent.
pub const REVIEWER_SYSTEM: &str = "You are a Resume Reviewer. \
    Goal: Produce a company-specific resume review report in Japanese. \
    Backstory: You are a professional career advisor.";

/// Reviewer task template.
/// Replace: {company}, {role}, {resume}, {keywords}, {concise_instruction},
///          {uncertainty_instruction}
pub const REVIEWER_PROMPT_TEMPLATE: &str = r#"Write the final report in Japanese, following this format:
【企業別レビュー報告書】
---
#### ■ 対象企業
{company}

#### ■ この企業が求めている核心的要素
- ...

#### ■ 履歴書の最適化アドバイス
- **強みの再定義**: ...
- **不足している情報の補足**: ...

#### ■ 修正後の自己PRイメージ
...

Use the resume text below and the extracted keywords. {concise_instruction}
{uncertainty_instruction}

Company: {company}
Role: {role}
Extracted keywords:
{keywords}
Resume:
{resume}
"#;
