//! Prompt text for the markdown and script routines.

use crate::descriptor::{Descriptor, TARGET_FILENAME_FIELD};

const NO_PREVIOUS_VERSION: &str = "No previous version available";

fn field(descriptor: &Descriptor, key: &str) -> String {
    descriptor.param_text(key).unwrap_or_default()
}

fn field_or(descriptor: &Descriptor, key: &str, default: &str) -> String {
    descriptor
        .param_text(key)
        .unwrap_or_else(|| default.to_string())
}

fn switch(descriptor: &Descriptor, key: &str) -> bool {
    descriptor.param(key).map(|v| v.trim() == "1").unwrap_or(false)
}

pub fn markdown_prompt(descriptor: &Descriptor, previous: Option<&str>) -> String {
    let assertion = |n: usize, key: &str| {
        descriptor
            .param_text(key)
            .map(|text| format!("{}. {}", n, text))
            .unwrap_or_default()
    };

    format!(
        "---
author: {author}
tagline_required: {tagline}
update_date: {date}
version: {version}
---

Generate markdown content for a document titled '{title}' with the following specifications:

Previous version content to reference:
{previous}

- Description: {description}
- Total words: approximately {total_words}
- Words per paragraph: approximately {words_per_paragraph}
- Total paragraphs: {total_paragraphs}
- Include introduction paragraph: {intro}
- Include concluding paragraph: {conclusion}

Key assertions to include:
{assertion_1}
{assertion_2}

Structure:
- Number of assertions: {assertions}
- Paragraphs per assertion: {paragraphs_per_assertion}
- Number of diagrams referenced: {diagrams}

Labels to include:
{labels}
",
        author = field(descriptor, "author"),
        tagline = field(descriptor, "tagline_required"),
        date = field(descriptor, "update_date"),
        version = field(descriptor, "version"),
        title = field(descriptor, TARGET_FILENAME_FIELD),
        previous = previous
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(NO_PREVIOUS_VERSION),
        description = field(descriptor, "description"),
        total_words = field_or(descriptor, "approx_total_words", "500"),
        words_per_paragraph = field_or(descriptor, "approx_words_per_paragraphs", "250"),
        total_paragraphs = field_or(descriptor, "total_paragraphs", "1"),
        intro = switch(descriptor, "intro_paragraph"),
        conclusion = switch(descriptor, "concluding_paragraph"),
        assertion_1 = assertion(1, "assertion_1_sentence"),
        assertion_2 = assertion(2, "assertion_2_sentence"),
        assertions = field_or(descriptor, "number_assertions", "0"),
        paragraphs_per_assertion = field_or(descriptor, "paragraph_per_assertions", "1"),
        diagrams = field_or(descriptor, "number_of_diagrams", "0"),
        labels = field(descriptor, "labels"),
    )
}

pub fn script_prompt(descriptor: &Descriptor, previous: Option<&str>) -> String {
    format!(
        "# author: {author}
# tagline_required: {tagline}
# update_date: {date}
# version: {version}

Generate script content for a script named '{name}'. The script should have the following description: '{description}'. The objective is '{objective}'. The input parameters are '{input}'. The output parameters are '{output}'. The language is '{language}'. The following labels should be included: '{labels}'. Here is the content of an existing script that may be helpful:
{previous}
",
        author = field(descriptor, "author"),
        tagline = field(descriptor, "tagline_required"),
        date = field(descriptor, "update_date"),
        version = field(descriptor, "version"),
        name = field(descriptor, TARGET_FILENAME_FIELD),
        description = field(descriptor, "description"),
        objective = field(descriptor, "objective"),
        input = field(descriptor, "input"),
        output = field(descriptor, "output"),
        language = field(descriptor, "language"),
        labels = field(descriptor, "labels").replace('\n', ", "),
        previous = previous.unwrap_or_default(),
    )
}
