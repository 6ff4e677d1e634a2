//! Static seed catalog and catalog merging.
//!
//! The selector treats every source alike, so merging only has to keep ids
//! unique. Earlier sources win.

use std::collections::HashSet;

use crate::types::{Difficulty, Question, QuestionType, TestCase};

struct Seed {
    id: &'static str,
    topic: &'static str,
    subtopic: &'static str,
    difficulty: Difficulty,
    title: &'static str,
    description: &'static str,
    starter: &'static str,
    solution: &'static str,
    tests: &'static [(&'static str, &'static str)],
    hints: &'static [&'static str],
    tags: &'static [&'static str],
    minutes: f64,
}

impl Seed {
    fn build(&self) -> Question {
        Question {
            id: self.id.to_string(),
            topic: self.topic.to_string(),
            subtopic: self.subtopic.to_string(),
            difficulty: self.difficulty,
            question_type: QuestionType::CodeWriting,
            title: self.title.to_string(),
            description: self.description.to_string(),
            starter_code: self.starter.to_string(),
            solution_code: Some(self.solution.to_string()),
            test_cases: self
                .tests
                .iter()
                .map(|(input, expected)| TestCase {
                    input: input.to_string(),
                    expected_output: expected.to_string(),
                })
                .collect(),
            hints: self.hints.iter().map(|h| h.to_string()).collect(),
            tags: self.tags.iter().map(|t| t.to_string()).collect(),
            estimated_time: self.minutes * 60.0,
        }
    }
}

const SEEDS: &[Seed] = &[
    Seed {
        id: "q1-basics-sum",
        topic: "Basics",
        subtopic: "arithmetic",
        difficulty: Difficulty::Easy,
        title: "Sum of Two Numbers",
        description: "Return the sum of two numbers.",
        starter: "def sum_numbers(a, b):\n    pass",
        solution: "def sum_numbers(a, b):\n    return a + b",
        tests: &[("2, 3", "5"), ("10, 20", "30"), ("-5, 5", "0")],
        hints: &["The + operator works on ints and floats", "Return the value instead of printing it"],
        tags: &["operators", "functions"],
        minutes: 3.0,
    },
    Seed {
        id: "q2-basics-even",
        topic: "Basics",
        subtopic: "conditionals",
        difficulty: Difficulty::Easy,
        title: "Check if Even",
        description: "Return True when n is even, False otherwise.",
        starter: "def is_even(n):\n    pass",
        solution: "def is_even(n):\n    return n % 2 == 0",
        tests: &[("4", "True"), ("7", "False"), ("0", "True")],
        hints: &["The modulo operator gives the remainder", "Compare n % 2 with 0"],
        tags: &["operators", "conditionals"],
        minutes: 3.0,
    },
    Seed {
        id: "q7-basics-max-of-three",
        topic: "Basics",
        subtopic: "conditionals",
        difficulty: Difficulty::Medium,
        title: "Largest of Three",
        description: "Return the largest of three numbers without calling max().",
        starter: "def largest(a, b, c):\n    pass",
        solution: "def largest(a, b, c):\n    best = a\n    if b > best:\n        best = b\n    if c > best:\n        best = c\n    return best",
        tests: &[("1, 2, 3", "3"), ("9, -1, 4", "9"), ("5, 5, 5", "5")],
        hints: &["Keep the best value seen so far", "Compare each remaining value against it"],
        tags: &["conditionals"],
        minutes: 6.0,
    },
    Seed {
        id: "q8-loops-count-vowels",
        topic: "Loops",
        subtopic: "iteration",
        difficulty: Difficulty::Easy,
        title: "Count Vowels",
        description: "Return how many vowels (a, e, i, o, u) appear in a lowercase string.",
        starter: "def count_vowels(s):\n    pass",
        solution: "def count_vowels(s):\n    return sum(1 for ch in s if ch in 'aeiou')",
        tests: &[("\"hello\"", "2"), ("\"rhythm\"", "0"), ("\"aeiou\"", "5")],
        hints: &["Walk the string one character at a time", "Membership tests use the in operator"],
        tags: &["loops", "strings"],
        minutes: 4.0,
    },
    Seed {
        id: "q3-loops-factorial",
        topic: "Loops",
        subtopic: "accumulation",
        difficulty: Difficulty::Medium,
        title: "Calculate Factorial",
        description: "Return n! for a non-negative integer n.",
        starter: "def factorial(n):\n    pass",
        solution: "def factorial(n):\n    result = 1\n    for i in range(2, n + 1):\n        result *= i\n    return result",
        tests: &[("5", "120"), ("0", "1"), ("3", "6")],
        hints: &["Multiply an accumulator inside a loop", "0! is 1"],
        tags: &["loops", "range"],
        minutes: 8.0,
    },
    Seed {
        id: "q4-loops-reverse",
        topic: "Loops",
        subtopic: "strings",
        difficulty: Difficulty::Medium,
        title: "Reverse a String",
        description: "Return the characters of s in reverse order.",
        starter: "def reverse_string(s):\n    pass",
        solution: "def reverse_string(s):\n    out = ''\n    for ch in s:\n        out = ch + out\n    return out",
        tests: &[("\"hello\"", "\"olleh\""), ("\"python\"", "\"nohtyp\"")],
        hints: &["Slicing with a negative step reverses", "Or prepend each character to a new string"],
        tags: &["loops", "strings"],
        minutes: 6.0,
    },
    Seed {
        id: "q9-loops-primes",
        topic: "Loops",
        subtopic: "nested loops",
        difficulty: Difficulty::Hard,
        title: "Primes Below N",
        description: "Return a list of all primes strictly less than n.",
        starter: "def primes_below(n):\n    pass",
        solution: "def primes_below(n):\n    return [p for p in range(2, n) if all(p % d for d in range(2, int(p ** 0.5) + 1))]",
        tests: &[("10", "[2, 3, 5, 7]"), ("2", "[]"), ("20", "[2, 3, 5, 7, 11, 13, 17, 19]")],
        hints: &["A number is prime when no divisor up to its square root divides it", "Use an inner loop for the divisor check"],
        tags: &["loops", "range", "math"],
        minutes: 15.0,
    },
    Seed {
        id: "q10-functions-greet",
        topic: "Functions",
        subtopic: "default arguments",
        difficulty: Difficulty::Easy,
        title: "Greeting with Default",
        description: "Return 'Hello, <name>!' and use 'World' when no name is given.",
        starter: "def greet(name=None):\n    pass",
        solution: "def greet(name='World'):\n    return f'Hello, {name}!'",
        tests: &[("\"Ada\"", "\"Hello, Ada!\""), ("", "\"Hello, World!\"")],
        hints: &["Parameters can have default values", "f-strings interpolate variables"],
        tags: &["functions", "strings"],
        minutes: 4.0,
    },
    Seed {
        id: "q5-functions-palindrome",
        topic: "Functions",
        subtopic: "string processing",
        difficulty: Difficulty::Hard,
        title: "Check Palindrome",
        description: "Return True when s reads the same forwards and backwards, ignoring case and spaces.",
        starter: "def is_palindrome(s):\n    pass",
        solution: "def is_palindrome(s):\n    cleaned = s.replace(' ', '').lower()\n    return cleaned == cleaned[::-1]",
        tests: &[("\"racecar\"", "True"), ("\"hello\"", "False"), ("\"Never odd or even\"", "True")],
        hints: &["Normalise the string first", "Compare it with its reverse"],
        tags: &["functions", "strings"],
        minutes: 15.0,
    },
    Seed {
        id: "q11-lists-filter-even",
        topic: "Lists",
        subtopic: "comprehensions",
        difficulty: Difficulty::Easy,
        title: "Keep Even Numbers",
        description: "Return a new list with only the even numbers of lst, in order.",
        starter: "def keep_even(lst):\n    pass",
        solution: "def keep_even(lst):\n    return [x for x in lst if x % 2 == 0]",
        tests: &[("[1, 2, 3, 4]", "[2, 4]"), ("[]", "[]"), ("[7, 9]", "[]")],
        hints: &["A list comprehension can take an if clause"],
        tags: &["lists", "comprehensions"],
        minutes: 4.0,
    },
    Seed {
        id: "q6-lists-sum-list",
        topic: "Lists",
        subtopic: "aggregation",
        difficulty: Difficulty::Hard,
        title: "Sum of Nested List",
        description: "Return the sum of all integers in a list that may contain nested lists.",
        starter: "def sum_list(lst):\n    pass",
        solution: "def sum_list(lst):\n    total = 0\n    for item in lst:\n        total += sum_list(item) if isinstance(item, list) else item\n    return total",
        tests: &[("[1, 2, 3, 4]", "10"), ("[1, [2, [3]]]", "6"), ("[]", "0")],
        hints: &["Recurse when an element is itself a list", "isinstance tells you the element type"],
        tags: &["lists", "recursion"],
        minutes: 15.0,
    },
    Seed {
        id: "q12-dictionaries-word-count",
        topic: "Dictionaries",
        subtopic: "counting",
        difficulty: Difficulty::Medium,
        title: "Word Frequencies",
        description: "Return a dict mapping each word of a sentence to how often it appears.",
        starter: "def word_count(sentence):\n    pass",
        solution: "def word_count(sentence):\n    counts = {}\n    for word in sentence.split():\n        counts[word] = counts.get(word, 0) + 1\n    return counts",
        tests: &[("\"a b a\"", "{'a': 2, 'b': 1}"), ("\"\"", "{}")],
        hints: &["str.split() breaks on whitespace", "dict.get accepts a default"],
        tags: &["dictionaries", "loops", "strings"],
        minutes: 8.0,
    },
];

pub fn seed_questions() -> Vec<Question> {
    SEEDS.iter().map(Seed::build).collect()
}

/// Concatenate sources keeping the first question seen for each id
pub fn merge_catalogs<'a, I>(sources: I) -> Vec<Question>
where
    I: IntoIterator<Item = &'a [Question]>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for source in sources {
        for question in source {
            if seen.insert(question.id.as_str()) {
                merged.push(question.clone());
            }
        }
    }
    merged
}

/// Distinct topics in catalog order
pub fn topics(catalog: &[Question]) -> Vec<String> {
    let mut seen = HashSet::new();
    catalog
        .iter()
        .filter(|q| seen.insert(q.topic.as_str()))
        .map(|q| q.topic.clone())
        .collect()
}
