//! Prompts sent to the language and image models.
//!
//! Keeping every prompt here means the record schema the model is asked for
//! and the schema [`crate::record::Record::from_json`] validates sit next to
//! each other in review, and tests can inspect prompts without a model.
//!
//! Callers can replace the extraction prompt via
//! [`crate::config::ExtractionConfig::prompt`].

use crate::record::Record;

/// Instruction sent with every page image.
///
/// The key list must stay in sync with the fields required by
/// [`Record::from_json`]: title, year, description, summary, inventor,
/// location, field, related.
pub const EXTRACTION_PROMPT: &str = r#"Summarize the inventions or discoveries on the following page. Please ignore sections entitled "In Addition".

Provide the following information for each invention or discovery. Output should be described as an array of JSON objects with the following keys (the values should all be strings):

  - title: One to three words describing the invention or discovery.
  - year: The year the invention or discovery was made. For years before the common era, append BCE (e.g. "450BCE").
  - description: The full text of the invention or discovery, as written in the provided image.
  - summary: Three sentences; the first describes necessary context to understand the invention. The second describes what the invention is, and the last sentence describes its implications. DO NOT MENTION PEOPLE OR DATES. Do not exceed 150 characters for this field.
  - inventor: The full name of the inventor or discoverer.
  - location: In which country was the invention or discovery made? In the case of Great Britain or the United Kingdom, use "England".
  - field: Should be one of Math, Science, Culture, War, General, Design, Geography, Space. Sub-fields can be indicated with a colon (e.g. "Science: Physics or Science: Biology"). Instead of "Science: Astronomy", use "Space".
  - related: One or more related previous invention or discovery, separated by commas. If there are no related inventions or discoveries, use "".

Remember to escape quotes in JSON strings, and ensure the JSON is valid."#;

/// Card-art prompt for one record.
pub fn card_art_prompt(record: &Record) -> String {
    format!(
        "{}\n\nGenerate vibrant art nouveau for the invention/discovery described above. \
The image should be a single object or scene that represents the invention/discovery. \
Please do not include any typography or text. Please do not draw any people.\n",
        record_brief(record)
    )
}

/// Social-post prompt for one record.
pub fn blurb_prompt(record: &Record) -> String {
    format!(
        "{}\n\nYour task is to write a tweet that will generate interest in my visual chronology \
of science & technology project. Don't use the word \"our\". The tweet should be engaging and \
informative. It should be no longer than 200 characters. Make it sound scientific and not too \
promotional, and include popular and relevant hashtags, but not more than three.",
        record_brief(record)
    )
}

/// The five-line description shared by the art and blurb prompts.
fn record_brief(record: &Record) -> String {
    format!(
        "Title: {}\nDescription: {}\nCategory: {}\nYear: {}\nPerson: {}",
        record.title(),
        record.summary(),
        record.field(),
        record.year(),
        record.inventor()
    )
}
