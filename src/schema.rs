use serde::{Deserialize, Serialize};

/// Versioned, declarative description of the fields an extraction should
/// produce, expressed as a structured prompt sent verbatim to the extraction
/// service. The service's crawler/LLM interprets the body; this side only
/// selects and transmits it.
#[derive(Debug, Clone, Copy)]
pub struct SchemaDescriptor {
    pub name: &'static str,
    pub version: u32,
    pub body: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Tutorial,
    Recipe,
}

impl ContentKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tutorial" => Some(Self::Tutorial),
            "recipe" => Some(Self::Recipe),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tutorial => "tutorial",
            Self::Recipe => "recipe",
        }
    }

    pub fn schema(self) -> &'static SchemaDescriptor {
        match self {
            Self::Tutorial => &TUTORIAL_SCHEMA,
            Self::Recipe => &RECIPE_SCHEMA,
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub static TUTORIAL_SCHEMA: SchemaDescriptor = SchemaDescriptor {
    name: "DIYTutorial",
    version: 2,
    body: r#"
name: DIYTutorial
description: |
  Extracts tutorial information from DIY sites.
  IMPORTANT: Only include steps that contain actual actionable instructions.
  Skip and exclude any steps that are:
  - Introduction or overview steps (this goes in the overview field instead)
  - Conclusion, summary, or "final thoughts" steps
  - Steps asking users to subscribe, follow, or vote
  - Steps promoting other content or products
  - Steps with only images and no real instructions
  - "Supplies" or "Materials" steps (these go in materials and tools instead)
  Renumber the remaining steps sequentially starting from 1.

fields:
  - name: title
    type: string
    description: The title of the tutorial/project
    required: true

  - name: overview
    type: string
    description: A descriptive summary of what this tutorial covers and builds
    required: true

  - name: image_url
    type: string
    description: URL of the main project/tutorial image

  - name: author
    type: string
    description: Name of the tutorial author

  - name: author_url
    type: string
    description: URL of the author's profile page

  - name: difficulty
    type: string
    description: Difficulty level (e.g., "Beginner", "Intermediate", "Advanced")

  - name: estimated_time
    type: string
    description: Estimated time to complete (e.g., "2-3 hours", "Weekend project")

  - name: glossary
    type: array
    description: Jargon or technique terms a beginner may not know
    items:
      type: object
      properties:
        term:
          type: string
          required: true
        definition:
          type: string
          required: true
        context:
          type: string
          description: Where in the tutorial the term appears

  - name: materials
    type: array
    description: Consumable materials needed for the project
    items:
      type: object
      properties:
        name:
          type: string
          description: Name of the material (be specific about type/size)
          required: true
        quantity:
          type: string
        unit:
          type: string
        notes:
          type: string
        measurement:
          type: object
          description: Conversion of the stated measurement
          properties:
            original:
              type: string
            metric:
              type: string
            imperial:
              type: string

  - name: tools
    type: array
    description: Tools needed for the project
    items:
      type: object
      properties:
        name:
          type: string
          required: true
        notes:
          type: string
        required:
          type: boolean
          description: false only when the tutorial says the tool is optional

  - name: steps
    type: array
    description: Step-by-step instructions with actual actionable content only
    items:
      type: object
      properties:
        step_number:
          type: integer
          description: Sequential number after filtering, starting at 1
          required: true
        title:
          type: string
          required: true
        instructions:
          type: string
          required: true
        tips:
          type: string
        image_urls:
          type: array
          items:
            type: string
        measurements:
          type: array
          items:
            type: object
            properties:
              original:
                type: string
              metric:
                type: string
              imperial:
                type: string
        helpful_links:
          type: array
          description: External resources that could help with this step
          items:
            type: object
            properties:
              title:
                type: string
                required: true
              url:
                type: string
                required: true
              type:
                type: string
                description: One of "tutorial", "video", "product", "reference"
                required: true
        skill_references:
          type: array
          description: Techniques this step assumes, for further study
          items:
            type: object
            properties:
              skill_name:
                type: string
                required: true
              difficulty:
                type: string
                description: One of "beginner", "intermediate", "advanced"
              description:
                type: string
              search_query:
                type: string
        safety_warnings:
          type: array
          items:
            type: object
            properties:
              warning:
                type: string
                required: true
              severity:
                type: string
                description: One of "caution", "warning", "danger"
              ppe_required:
                type: array
                items:
                  type: string
"#,
};

pub static RECIPE_SCHEMA: SchemaDescriptor = SchemaDescriptor {
    name: "Recipe",
    version: 2,
    body: r#"
name: Recipe
description: Extract recipe details from a webpage

fields:
  - name: title
    type: string
    required: true
    description: The recipe name or title

  - name: description
    type: string
    description: Brief description or intro paragraph

  - name: image_url
    type: string
    description: URL of the main recipe image

  - name: author
    type: string

  - name: author_url
    type: string

  - name: prep_time
    type: string
    description: Preparation time (e.g., "15 minutes")

  - name: cook_time
    type: string
    description: Cooking time (e.g., "30 minutes")

  - name: total_time
    type: string
    description: Total time (e.g., "45 minutes")

  - name: servings
    type: integer
    description: Number of servings

  - name: ingredients
    type: array
    items:
      type: object
      properties:
        name:
          type: string
          required: true
        quantity:
          type: string
          description: Amount (e.g., "2", "1/2")
        unit:
          type: string
          description: Unit of measure (e.g., "cups", "tbsp")
        notes:
          type: string
          description: Preparation notes (e.g., "diced", "softened")
        measurement:
          type: object
          properties:
            original:
              type: string
            metric:
              type: string
            imperial:
              type: string

  - name: instructions
    type: array
    description: Step-by-step instructions
    items:
      type: object
      properties:
        step:
          type: integer
          description: Step number
        text:
          type: string
          required: true
        image_urls:
          type: array
          items:
            type: string
"#,
};

#[cfg(test)]
mod tests {
    use super::ContentKind;

    #[test]
    fn parse_accepts_case_and_whitespace() {
        assert_eq!(ContentKind::parse(" Tutorial "), Some(ContentKind::Tutorial));
        assert_eq!(ContentKind::parse("recipe"), Some(ContentKind::Recipe));
        assert_eq!(ContentKind::parse("podcast"), None);
    }

    #[test]
    fn schema_bodies_declare_required_title() {
        for kind in [ContentKind::Tutorial, ContentKind::Recipe] {
            let schema = kind.schema();
            assert!(schema.body.contains("name: title"), "kind={kind}");
            assert!(schema.version >= 1);
        }
    }
}
