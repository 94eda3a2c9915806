//! System and user prompts for each review mode.

use crate::models::ReviewMode;

const FULL_PROMPT: &str = "\
You are an expert code reviewer looking at the changes in a pull request.
Give specific, actionable feedback on:
1. Code quality issues
2. Potential bugs or logic errors
3. Security vulnerabilities
4. Performance improvements
5. Readability and maintainability

For each issue, identify the exact line it concerns, explain the problem \
clearly, and propose a fix. Rate each issue as info, warning, error or security.

Keep suggestions concise and focus on the issues that matter most.";

const SECURITY_PROMPT: &str = "\
You are a security-focused code reviewer looking at the changes in a pull request.
Report only security vulnerabilities, for example:
1. Injection flaws (SQL, NoSQL, command injection and similar)
2. Authentication and authorization problems
3. Exposure of sensitive data
4. XSS, CSRF and other web vulnerabilities
5. Insecure dependencies or API usage
6. Missing or weak input validation

For each vulnerability, identify the exact line, explain the risk, and \
propose a secure implementation. Rate the risk as low, medium, high or critical.

Ignore code quality issues that have no security impact.";

const OPTIMIZATION_PROMPT: &str = "\
You are a performance expert looking at the changes in a pull request.
Report only performance issues, for example:
1. Inefficient algorithms or data structures
2. Redundant computation
3. Memory leaks or excessive allocation
4. Unnecessary network requests or database queries
5. Rendering performance problems
6. Expensive operations that could be cheaper

For each issue, identify the exact line, explain the performance impact, and \
propose an optimization with its expected benefit. Rate the priority as low, \
medium or high.

Ignore code quality and security issues that have no performance impact.";

const RESPONSE_FORMAT: &str = r#"Respond with your suggestions in this JSON format:
[
  {
    "filePath": "path/to/file.js",
    "lineNumber": 42,
    "message": "Your suggestion here",
    "severity": "info|warning|error|security"
  }
]

Respond only with valid JSON. Do not include any other text."#;

/// Prompt used when checking that the provider is reachable.
pub const PING_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const PING_USER_PROMPT: &str = "Say hello and confirm you are working correctly.";

/// The system prompt for a review mode.
pub fn system_prompt(mode: ReviewMode) -> &'static str {
    match mode {
        ReviewMode::Full => FULL_PROMPT,
        ReviewMode::Security => SECURITY_PROMPT,
        ReviewMode::Optimization => OPTIMIZATION_PROMPT,
    }
}

/// The user prompt wrapping the rendered diff context.
pub fn build_user_prompt(context: &str) -> String {
    format!("Here is the code to review:\n\n{context}\n{RESPONSE_FORMAT}")
}
