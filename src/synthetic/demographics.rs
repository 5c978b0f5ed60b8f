//! Demographic pools for generated records.
//!
//! Names and contact details are fictional.

pub const INDIAN_STATES: &[(&str, &[&str])] = &[
    ("Maharashtra", &["Mumbai", "Pune", "Nagpur"]),
    ("Karnataka", &["Bangalore", "Mysore", "Hubli"]),
    ("Tamil Nadu", &["Chennai", "Coimbatore", "Madurai"]),
    ("Kerala", &["Kochi", "Thiruvananthapuram", "Kozhikode"]),
    ("Delhi", &["New Delhi", "Dwarka", "Rohini"]),
    ("Uttar Pradesh", &["Lucknow", "Noida", "Varanasi"]),
    ("Gujarat", &["Ahmedabad", "Surat", "Vadodara"]),
    ("Rajasthan", &["Jaipur", "Jodhpur", "Udaipur"]),
    ("West Bengal", &["Kolkata", "Howrah", "Siliguri"]),
    ("Telangana", &["Hyderabad", "Warangal", "Nizamabad"]),
    ("Andhra Pradesh", &[]),
    ("Madhya Pradesh", &[]),
    ("Punjab", &[]),
    ("Haryana", &[]),
    ("Bihar", &[]),
];

/// Country, state, city.
pub const INTERNATIONAL_LOCATIONS: &[(&str, &str, &str)] = &[
    ("United States", "California", "Los Angeles"),
    ("United States", "New York", "New York City"),
    ("United States", "Texas", "Houston"),
    ("United Kingdom", "England", "London"),
    ("United Kingdom", "Scotland", "Edinburgh"),
    ("Canada", "Ontario", "Toronto"),
    ("Australia", "New South Wales", "Sydney"),
    ("Germany", "Bavaria", "Munich"),
    ("UAE", "Dubai", "Dubai"),
    ("Singapore", "Central", "Singapore"),
];

pub const MEDICATIONS: &[&str] = &[
    "Paracetamol",
    "Ibuprofen",
    "Metformin",
    "Amlodipine",
    "Atorvastatin",
    "Omeprazole",
    "Levothyroxine",
    "Aspirin",
    "Lisinopril",
    "Metoprolol",
    "Amoxicillin",
    "Azithromycin",
    "Cetirizine",
    "Pantoprazole",
    "Montelukast",
];

/// `None` in a sample means "no allergies".
pub const ALLERGIES: &[&str] = &[
    "Penicillin",
    "Sulfa drugs",
    "Aspirin",
    "NSAIDs",
    "Latex",
    "Peanuts",
    "Shellfish",
    "Dust",
    "Pollen",
    "None",
];

/// First and last name pools for one region.
#[derive(Debug, Clone, Copy)]
pub struct NamePool {
    pub male: &'static [&'static str],
    pub female: &'static [&'static str],
    pub last: &'static [&'static str],
    pub email_domain: &'static str,
}

pub const INDIAN_NAMES: NamePool = NamePool {
    male: &[
        "Aarav", "Vivaan", "Aditya", "Arjun", "Rohan", "Kabir", "Ishaan", "Rahul", "Vikram",
        "Sanjay", "Anil", "Rajesh", "Karthik", "Nikhil", "Pranav",
    ],
    female: &[
        "Ananya", "Diya", "Priya", "Kavya", "Isha", "Meera", "Aditi", "Pooja", "Sneha", "Lakshmi",
        "Neha", "Riya", "Divya", "Anjali", "Shreya",
    ],
    last: &[
        "Sharma", "Verma", "Iyer", "Nair", "Reddy", "Patel", "Gupta", "Singh", "Menon", "Rao",
        "Das", "Joshi", "Kulkarni", "Chatterjee", "Pillai",
    ],
    email_domain: "example.in",
};

pub const US_NAMES: NamePool = NamePool {
    male: &[
        "James", "Michael", "Robert", "David", "William", "Daniel", "Matthew", "Anthony",
        "Joshua", "Andrew",
    ],
    female: &[
        "Mary", "Jennifer", "Linda", "Elizabeth", "Susan", "Jessica", "Sarah", "Karen", "Emily",
        "Ashley",
    ],
    last: &[
        "Smith", "Johnson", "Williams", "Brown", "Jones", "Miller", "Davis", "Garcia", "Wilson",
        "Moore",
    ],
    email_domain: "example.com",
};

pub const UK_NAMES: NamePool = NamePool {
    male: &[
        "Oliver", "George", "Harry", "Jack", "Charlie", "Thomas", "Oscar", "Alfie", "Henry",
        "Edward",
    ],
    female: &[
        "Olivia", "Amelia", "Isla", "Ava", "Emily", "Sophie", "Grace", "Lily", "Freya",
        "Charlotte",
    ],
    last: &[
        "Taylor", "Evans", "Thomas", "Roberts", "Walker", "Wright", "Hughes", "Edwards", "Green",
        "Hall",
    ],
    email_domain: "example.co.uk",
};

/// Phone number format for a country.
#[must_use]
pub fn phone_prefix(country: &str) -> &'static str {
    match country {
        "India" => "+91",
        "United States" | "Canada" => "+1",
        "United Kingdom" => "+44",
        "Australia" => "+61",
        "Germany" => "+49",
        "UAE" => "+971",
        "Singapore" => "+65",
        _ => "+00",
    }
}
