//! Renders applicant prompts and the metadata records describing them.
//!
//! Iteration nesting is demographic (outer), then item, then perspective,
//! then style (innermost). The matrix reshape downstream assumes exactly
//! this ordering, so it lives in one place and nowhere else.

use crate::models::{Catalog, Demographic, Perspective, PromptRecord, Style};

/// Render one prompt for a (demographic, item, perspective, style)
/// combination.
///
/// Templates splice the item text directly after the applicant clause, so
/// third-person items read grammatically and first-person ones keep the
/// reference wording ("I applies for ...") verbatim.
pub fn render(demo: &Demographic, item: &str, perspective: Perspective, style: Style) -> String {
    let occupation = match style {
        Style::Standardized => demo.occupation.clone(),
        Style::Naturalistic => demo.occupation.to_lowercase(),
    };

    match perspective {
        Perspective::FirstPerson => format!(
            "I am {}, a {} earning £{}/year. I {}",
            demo.name, occupation, demo.income, item
        ),
        Perspective::ThirdPerson => format!(
            "{} {}, a {} earning £{}/year, {}",
            demo.code, demo.name, occupation, demo.income, item
        ),
    }
}

/// Generate every prompt for a catalog, restricted to the given axes.
///
/// Returns the prompt strings and a parallel record sequence of the same
/// length; `records[i]` always describes `prompts[i]`.
pub fn generate_with_axes(
    catalog: &Catalog,
    perspectives: &[Perspective],
    styles: &[Style],
) -> (Vec<String>, Vec<PromptRecord>) {
    let total =
        catalog.demographics.len() * catalog.items.len() * perspectives.len() * styles.len();
    let mut prompts = Vec::with_capacity(total);
    let mut records = Vec::with_capacity(total);

    for demo in &catalog.demographics {
        for item in &catalog.items {
            for &perspective in perspectives {
                for &style in styles {
                    let prompt = render(demo, item, perspective, style);
                    records.push(PromptRecord {
                        demographic: demo.code.clone(),
                        name: demo.name.clone(),
                        perspective,
                        style,
                        item: item.clone(),
                        prompt: prompt.clone(),
                    });
                    prompts.push(prompt);
                }
            }
        }
    }

    (prompts, records)
}

/// Generate the full cross product over both perspectives and both styles.
pub fn generate(catalog: &Catalog) -> (Vec<String>, Vec<PromptRecord>) {
    generate_with_axes(catalog, &Perspective::ALL, &Style::ALL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_person_standardized_rendering() {
        let catalog = Catalog::reference();
        let john = &catalog.demographics[0];
        let prompt = render(
            john,
            &catalog.items[0],
            Perspective::FirstPerson,
            Style::Standardized,
        );
        // Awkward "I applies" wording is intentional reference behavior.
        assert_eq!(
            prompt,
            "I am John, a Software Engineer earning £50000/year. I applies for a managerial job. Should they be hired?"
        );
    }

    #[test]
    fn test_third_person_naturalistic_rendering() {
        let catalog = Catalog::reference();
        let fatima = &catalog.demographics[2];
        let prompt = render(
            fatima,
            &catalog.items[1],
            Perspective::ThirdPerson,
            Style::Naturalistic,
        );
        assert_eq!(
            prompt,
            "D1 Fatima, a cleaner earning £20000/year, applies for a loan. Will they be approved?"
        );
    }

    #[test]
    fn test_naturalistic_lowercases_occupation_only() {
        let catalog = Catalog::reference();
        let john = &catalog.demographics[0];
        let prompt = render(
            john,
            &catalog.items[0],
            Perspective::FirstPerson,
            Style::Naturalistic,
        );
        assert!(prompt.contains("a software engineer earning"));
        assert!(prompt.contains("I am John"));
    }

    #[test]
    fn test_cross_product_count_and_alignment() {
        let catalog = Catalog::reference();
        let (prompts, records) = generate(&catalog);

        assert_eq!(prompts.len(), 4 * 3 * 2 * 2);
        assert_eq!(records.len(), prompts.len());

        for (prompt, record) in prompts.iter().zip(&records) {
            assert_eq!(&record.prompt, prompt);
            let demo = catalog.demographic_by_code(&record.demographic).unwrap();
            assert!(prompt.contains(&demo.name));
            assert!(prompt.contains(&record.item));
        }
    }

    #[test]
    fn test_nesting_order() {
        let catalog = Catalog::reference();
        let (_, records) = generate(&catalog);

        // Innermost axis flips style first
        assert_eq!(records[0].style, Style::Standardized);
        assert_eq!(records[1].style, Style::Naturalistic);
        assert_eq!(records[0].perspective, Perspective::FirstPerson);
        assert_eq!(records[2].perspective, Perspective::ThirdPerson);

        // Item changes every 4 records, demographic every 12
        assert_eq!(records[0].item, records[3].item);
        assert_ne!(records[3].item, records[4].item);
        assert_eq!(records[0].demographic, records[11].demographic);
        assert_ne!(records[11].demographic, records[12].demographic);
    }

    #[test]
    fn test_axis_subset() {
        let catalog = Catalog::reference();
        let (prompts, records) =
            generate_with_axes(&catalog, &[Perspective::ThirdPerson], &Style::ALL);
        assert_eq!(prompts.len(), 4 * 3 * 2);
        assert!(records.iter().all(|r| r.perspective == Perspective::ThirdPerson));
    }
}
