// AI prompt templates for the interview pipeline.
// Fill with `llm_client::prompts::fill_template`.

/// Question-set generation prompt.
/// Placeholders: {count}, {position}, {description}, {experience}, {tech_stack}, {json_only}
pub const QUESTION_SET_PROMPT_TEMPLATE: &str = r#"As an experienced technical interviewer, generate a JSON array containing {count} technical interview questions along with detailed answers based on the following job information. Each object in the array must have exactly the fields "question" and "answer", formatted as follows:

[
  { "question": "<Question text>", "answer": "<Answer text>" },
  ...
]

Job Information:
- Job Position: {position}
- Job Description: {description}
- Years of Experience Required: {experience}
- Tech Stacks: {tech_stack}

The questions should assess skills in {tech_stack} development and best practices, problem-solving, and experience handling complex requirements.

Return ONLY the JSON array of {count} question/answer objects. {json_only}"#;

/// Answer evaluation prompt.
/// Placeholders: {question}, {user_answer}, {correct_answer}, {json_only}
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"Respond only with a valid JSON object like this:
{
  "ratings": number (1 to 10),
  "feedback": string
}
{json_only}

Question: """{question}"""
User Answer: """{user_answer}"""
Correct Answer: """{correct_answer}"""

Evaluate the user answer against the correct answer. Rate it from 1 to 10 and give concise feedback on what was good and what should be improved."#;
