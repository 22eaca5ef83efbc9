// Navigation state management.
// Handles the navigation stack and breadcrumb trail between the list and a restaurant.

/// A node in the navigation breadcrumb trail.
#[derive(Debug, Clone)]
pub struct BreadcrumbNode {
    /// Display label for the breadcrumb.
    pub label: String,
    /// The view level this node represents.
    pub level: ViewLevel,
}

/// The current view level in the navigation hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewLevel {
    /// Top level: filterable list of restaurants
    Restaurants,
    /// Detail view with reviews and the review form
    Restaurant { id: u64, name: String },
}

static ROOT: ViewLevel = ViewLevel::Restaurants;

impl ViewLevel {
    /// Get the display title for this view level.
    pub fn title(&self) -> String {
        match self {
            ViewLevel::Restaurants => "Restaurants".to_string(),
            ViewLevel::Restaurant { name, .. } => format!("{} / Reviews", name),
        }
    }

    /// Create a breadcrumb node for this view level.
    pub fn to_breadcrumb(&self) -> BreadcrumbNode {
        let label = match self {
            ViewLevel::Restaurants => "Restaurants".to_string(),
            ViewLevel::Restaurant { name, .. } => name.clone(),
        };
        BreadcrumbNode {
            label,
            level: self.clone(),
        }
    }
}

/// Navigation stack for the restaurants tab.
#[derive(Debug, Clone)]
pub struct NavigationStack {
    /// Stack of view levels (bottom = root, top = current)
    stack: Vec<ViewLevel>,
}

impl NavigationStack {
    /// Create a new navigation stack starting at the given level.
    pub fn new(root: ViewLevel) -> Self {
        Self { stack: vec![root] }
    }

    /// Get the current view level.
    pub fn current(&self) -> &ViewLevel {
        self.stack.last().unwrap_or(&ROOT)
    }

    /// Push a new view level onto the stack (drill down).
    pub fn push(&mut self, level: ViewLevel) {
        self.stack.push(level);
    }

    /// Pop the current view level (go back). Returns false if at root.
    pub fn pop(&mut self) -> bool {
        if self.can_go_back() {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    pub fn can_go_back(&self) -> bool {
        self.stack.len() > 1
    }

    /// Get the breadcrumb trail.
    pub fn breadcrumbs(&self) -> Vec<BreadcrumbNode> {
        self.stack
            .iter()
            .map(|level| level.to_breadcrumb())
            .collect()
    }
}

impl Default for NavigationStack {
    fn default() -> Self {
        Self::new(ViewLevel::Restaurants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_stack() {
        let mut nav = NavigationStack::default();

        assert_eq!(nav.breadcrumbs().len(), 1);
        assert!(!nav.can_go_back());
        assert_eq!(nav.current(), &ViewLevel::Restaurants);

        nav.push(ViewLevel::Restaurant {
            id: 3,
            name: "Kang Ho Dong Baekjeong".to_string(),
        });
        assert_eq!(nav.breadcrumbs().len(), 2);
        assert!(nav.can_go_back());
        assert_eq!(nav.current().title(), "Kang Ho Dong Baekjeong / Reviews");

        assert!(nav.pop());
        assert_eq!(nav.breadcrumbs().len(), 1);

        // Can't pop past root
        assert!(!nav.pop());
        assert_eq!(nav.current(), &ViewLevel::Restaurants);
    }

    #[test]
    fn test_breadcrumbs() {
        let mut nav = NavigationStack::default();
        nav.push(ViewLevel::Restaurant {
            id: 2,
            name: "Emily".to_string(),
        });

        let breadcrumbs = nav.breadcrumbs();
        assert_eq!(breadcrumbs.len(), 2);
        assert_eq!(breadcrumbs[0].label, "Restaurants");
        assert_eq!(breadcrumbs[1].label, "Emily");
    }
}
