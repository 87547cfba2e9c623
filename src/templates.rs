//! Built-in letter templates
//!
//! Starting points offered when composing. Bodies are in Bangla with
//! bracketed placeholders for the writer to fill in.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub content: &'static str,
}

pub const TEMPLATES: &[Template] = &[
    Template {
        id: "friend",
        title: "বন্ধুকে চিঠি",
        description: "বন্ধুকে লেখা একটি সাধারণ চিঠির টেমপ্লেট",
        content: "প্রিয় বন্ধু,\n\n\
                  আশা করি তুমি ভালো আছো। আমি এখানে ভালো আছি।\n\n\
                  তোমার সাথে দেখা না হয়ে অনেক দিন হয়ে গেছে। কবে দেখা হবে?\n\n\
                  তোমার বন্ধু,\n\
                  [আপনার নাম]",
    },
    Template {
        id: "family",
        title: "পরিবারকে চিঠি",
        description: "পরিবারের সদস্যদের লেখা একটি চিঠির টেমপ্লেট",
        content: "প্রিয় পরিবার,\n\n\
                  আশা করি সবাই ভালো আছেন। আমি এখানে ভালো আছি।\n\n\
                  আমার জীবন এখানে কেমন যাচ্ছে তা জানাতে চাই।\n\n\
                  ভালোবাসা,\n\
                  [আপনার নাম]",
    },
    Template {
        id: "official",
        title: "অফিসিয়াল চিঠি",
        description: "অফিসিয়াল উদ্দেশ্যে লেখা একটি চিঠির টেমপ্লেট",
        content: "জনাব/জনাবা,\n\n\
                  বিষয়: [বিষয় লিখুন]\n\n\
                  মহোদয়/মহোদয়া,\n\n\
                  আপনার দৃষ্টি আকর্ষণ করতে চাই যে...\n\n\
                  আপনার বিশ্বস্ত,\n\
                  [আপনার নাম]\n\
                  [পদবি]",
    },
    Template {
        id: "thank-you",
        title: "ধন্যবাদ চিঠি",
        description: "কাউকে ধন্যবাদ জানাতে লেখা একটি চিঠির টেমপ্লেট",
        content: "প্রিয় [নাম],\n\n\
                  আপনার সাহায্যের জন্য আন্তরিক ধন্যবাদ জানাই।\n\n\
                  আপনার সহযোগিতা আমার জন্য খুবই মূল্যবান ছিল।\n\n\
                  কৃতজ্ঞতাসহ,\n\
                  [আপনার নাম]",
    },
    Template {
        id: "congratulations",
        title: "অভিনন্দন চিঠি",
        description: "কাউকে অভিনন্দন জানাতে লেখা একটি চিঠির টেমপ্লেট",
        content: "প্রিয় [নাম],\n\n\
                  আপনার সাফল্যের জন্য আন্তরিক অভিনন্দন জানাই।\n\n\
                  আপনার এই অর্জন আমাদের সকলের জন্য গর্বের বিষয়।\n\n\
                  শুভকামনা সহ,\n\
                  [আপনার নাম]",
    },
    Template {
        id: "greetings",
        title: "শুভেচ্ছা চিঠি",
        description: "কাউকে শুভেচ্ছা জানাতে লেখা একটি চিঠির টেমপ্লেট",
        content: "প্রিয় [নাম],\n\n\
                  আপনার জন্য শুভেচ্ছা রইল।\n\n\
                  আশা করি আপনি ভালো আছেন এবং আপনার জীবন সুখময়।\n\n\
                  শুভকামনা সহ,\n\
                  [আপনার নাম]",
    },
];

/// Look up a template by id
pub fn template(id: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.id == id)
}
