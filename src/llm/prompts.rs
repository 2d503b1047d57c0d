//! Default prompts for screenshot comparison.
//!
//! Both can be replaced through the `prompts` section of the config file.

/// Collection of built-in prompts.
pub struct Prompts;

impl Prompts {
    /// System instruction for the vision judge.
    pub fn system() -> &'static str {
        "You are an advanced AI model equipped with OCR and image processing capabilities, capable of analyzing visual elements in detail."
    }

    /// User instruction describing the ten-point rubric.
    ///
    /// The order of the questions fixes the order of the scores in the
    /// reply, which is what the rubric parser expects.
    pub fn rubric() -> &'static str {
        r#"Your task is to assess two webpage images and output a score between 0 and 10 for each of the following questions.
If the answer to a question is a definite YES, output a score of 10, signifying perfect similarity.
Conversely, a definite NO should yield a score of 0, indicating no similarity.
For answers that fall in between, assign a score accordingly, where a higher number indicates a greater degree of similarity. Only provide the numerical score for each question, without any additional text.
Example contexts are provided for clarity. Examples provide the idea, but you can output any number in the 0-10 range accordingly. Only output a comma separated list containing 10 numbers. DO NOT give a score of 10 for any category unless the two images are identical.

Layout Consistency (Score: 0-10): Does the placement of headers, footers, and sidebars match in both webpages? (e.g., A score of 10 for identical layouts, 5 for similar but not exact placements, and 0 for completely different layouts.)
Element Alignment (Score: 0-10): Are elements like images, buttons, and text boxes aligned similarly on both pages? (e.g., A score of 10 for perfectly aligned elements, 6 for slight misalignments, and 0 for major misalignments.)
Proportional Accuracy (Score: 0-10): Do the sizes and aspect ratios of images, buttons, and text boxes appear consistent across both pages? (e.g., A score of 10 for exact proportions, 4 for noticeable size differences, and 0 for drastic inconsistencies.)
Visual Harmony (Score: 0-10): Do both webpages exhibit a similar level of visual harmony and balance in their design? (e.g., A score of 10 for harmonious designs, 5 for some dissonance, and 0 for clashing designs.)

Color Scheme and Aesthetic Match (Score: 0-10): How closely do the color schemes of the two webpages align in terms of background and text colors? Evaluate the similarity in hues, saturation, and overall color aesthetics. (e.g., A score of 10 for perfectly matching color schemes, 6 for similar color palettes with minor variations, and 0 for starkly different color schemes.)
Aesthetic Resemblance (Score: 0-10): Is the overall aesthetic appeal (modern, minimalistic, traditional, etc.) similar on both pages? (e.g., A score of 10 for identical aesthetics, 4 for somewhat similar but distinguishable styles, and 0 for completely different aesthetics.)

Font Characteristics and Consistency (Score: 0-10): Assess the consistency of font type, size, style (italic, bold) and weight across both webpages. (e.g., A score of 10 for complete uniformity, 5 for consistent type and size but different style or weight, and 0 for wide disparities.)
Textual Content Match (Score: 0-10): Do the words and sentences match between the two webpages? (e.g., A score of 10 for identical text, 5 for some similar paragraphs or sections, and 0 for completely different textual content.)
Numeric and Special Character Accuracy (Score: 0-10): Are numbers, dates, and special characters (like email addresses) consistent between the two pages? (e.g., A score of 10 for exact matches, 6 for minor discrepancies, and 0 for major differences.)

User Interface Consistency (Score: 0-10): Do the user interface elements (like menus, buttons, and forms) on both pages share a similar design language and appearance? (e.g., A score of 10 for identical UI elements, 6 for slight design variations, and 0 for completely different UI designs.)"#
    }

    /// Minimal prompt used by the connectivity check.
    pub fn ping() -> &'static str {
        "Say 'hello' and nothing else."
    }
}
