use recipe_intake::url_to_text::html::extractors::{
    Extractor, HtmlClassExtractor, JsonLdExtractor, MicroDataExtractor, ParsingContext,
};

#[test]
fn test_microdata_extraction() {
    let html = r#"
    <html>
    <body>
    <div id="easyrecipe-557-0" class="easyrecipe" itemscope itemtype="http://schema.org/Recipe">
        <div itemprop="name" class="ERSName">Mom's Famous Banana Bread</div>
        <div itemprop="description" class="ERSSummary">Mom was kind enough to share her famous banana bread recipe with us!</div>
        <img itemprop="image" src="https://example.com/banana-bread.jpg" />
        <div itemprop="author" itemscope itemtype="http://schema.org/Person">
            <span itemprop="name">Cooking Divine</span>
        </div>
        <div itemprop="recipeCategory">Breakfast</div>
        <div itemprop="recipeCuisine">American</div>
        <div itemprop="keywords">banana, bread, sweet</div>
        <div class="ERSIngredients">
            <ul>
                <li class="ingredient" itemprop="ingredients">5 Tablespoons Butter (room temperature)</li>
                <li class="ingredient" itemprop="ingredients">1 Cup White Sugar</li>
                <li class="ingredient" itemprop="ingredients">1 Large Egg</li>
            </ul>
        </div>
        <div class="ERSInstructions">
            <ol>
                <li class="instruction" itemprop="recipeInstructions">Preheat oven to 350 degrees and heavily grease a 9 inch bread pan.</li>
                <li class="instruction" itemprop="recipeInstructions">Beat butter and sugar until light, fluffy and well blended.</li>
            </ol>
        </div>
    </div>
    </body>
    </html>
    "#;

    let context = ParsingContext::new("https://www.cookingdivine.com/recipes/banana-bread/", html);
    let recipe = MicroDataExtractor.parse(&context).expect("microdata recipe");

    assert_eq!(recipe.title, "Mom's Famous Banana Bread");
    assert_eq!(recipe.ingredients.len(), 3);
    assert_eq!(recipe.ingredients[0], "5 Tablespoons Butter (room temperature)");
    assert_eq!(recipe.steps.len(), 2);
    assert!(recipe.steps[0].starts_with("Preheat oven to 350 degrees"));
    assert_eq!(
        recipe.image_url.as_deref(),
        Some("https://example.com/banana-bread.jpg")
    );
    for tag in ["breakfast", "american", "banana", "bread", "sweet"] {
        assert!(recipe.tags.contains(tag), "missing tag {tag}");
    }
}

#[test]
fn test_json_ld_sections_in_graph() {
    let html = r#"
    <html><head>
    <script type="application/ld+json">
    {
      "@context": "https://schema.org",
      "@graph": [
        {"@type": "WebPage", "name": "Vegane Brookies | Bianca Zapatka"},
        {
          "@type": ["Recipe"],
          "name": "Vegane Brookies - Chocolate Chip Cookie Brownies",
          "image": [
            "https://biancazapatka.com/wp-content/uploads/2022/09/cookie-brownies.jpg",
            "https://biancazapatka.com/wp-content/uploads/2022/09/cookie-brownies-500x500.jpg"
          ],
          "keywords": "Brookies, Brownies, Cookies",
          "recipeCategory": ["Dessert", "Snack"],
          "recipeIngredient": ["200 g Zartbitterschokolade", "120 g Margarine", "150 g Mehl"],
          "recipeInstructions": [
            {
              "@type": "HowToSection",
              "name": "Brownie-Teig",
              "itemListElement": [
                {"@type": "HowToStep", "text": "Schokolade und Margarine schmelzen."},
                {"@type": "HowToStep", "text": "Mehl unterrühren."}
              ]
            },
            {
              "@type": "HowToSection",
              "name": "Cookie-Teig",
              "itemListElement": [
                {"@type": "HowToStep", "text": "Cookie-Teig auf dem Brownie-Teig verteilen und backen."}
              ]
            }
          ]
        }
      ]
    }
    </script>
    </head><body></body></html>
    "#;

    let context = ParsingContext::new("https://biancazapatka.com/de/brookies/", html);
    let recipe = JsonLdExtractor.parse(&context).expect("json-ld recipe");

    assert_eq!(recipe.title, "Vegane Brookies - Chocolate Chip Cookie Brownies");
    assert_eq!(recipe.ingredients.len(), 3);
    assert_eq!(
        recipe.steps,
        vec![
            "Schokolade und Margarine schmelzen.",
            "Mehl unterrühren.",
            "Cookie-Teig auf dem Brownie-Teig verteilen und backen."
        ]
    );
    assert_eq!(
        recipe.image_url.as_deref(),
        Some("https://biancazapatka.com/wp-content/uploads/2022/09/cookie-brownies.jpg")
    );
    assert!(recipe.tags.contains("dessert"));
    assert!(recipe.tags.contains("brookies"));
}

#[test]
fn test_page_without_markup_is_not_applicable_to_schema_extractors() {
    let html = "<html><body><h1>Dinner ideas</h1><p>Nothing structured here.</p></body></html>";
    let context = ParsingContext::new("https://example.com/", html);

    assert!(JsonLdExtractor.parse(&context).is_err());
    assert!(MicroDataExtractor.parse(&context).is_err());
    assert!(HtmlClassExtractor.parse(&context).is_err());
}
