/// 상품 컬럼 목록으로 시작하는 조회 (scope 조건은 뒤에 붙인다)
pub const SELECT_ITEMS: &str = "SELECT id, user_id, buyer_id, name, description, price, shipping_cost_covered, deadline, status, created_at FROM items";

/// 상품 등록
pub const INSERT_ITEM: &str = r#"
    INSERT INTO items (user_id, buyer_id, name, description, price, shipping_cost_covered, deadline, status, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
    RETURNING id, user_id, buyer_id, name, description, price, shipping_cost_covered, deadline, status, created_at
"#;

/// 상품 저장 (저장 직전의 상태도 함께 반환)
pub const UPDATE_ITEM: &str = r#"
    WITH previous AS (
        SELECT id, status FROM items WHERE id = $1 FOR UPDATE
    )
    UPDATE items
    SET buyer_id = $2, name = $3, description = $4, price = $5,
        shipping_cost_covered = $6, deadline = $7, status = $8
    FROM previous
    WHERE items.id = previous.id
    RETURNING items.id, items.user_id, items.buyer_id, items.name, items.description, items.price,
              items.shipping_cost_covered, items.deadline, items.status, items.created_at,
              previous.status AS previous_status
"#;

/// 사용자 존재 확인
pub const USER_EXISTS: &str = "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)";

/// 상품 삭제
pub const DELETE_ITEM: &str = "DELETE FROM items WHERE id = $1";

/// 상품 구매 신청 삭제
pub const DELETE_ITEM_PURCHASE_REQUESTS: &str = "DELETE FROM purchase_requests WHERE item_id = $1";

/// 상품 댓글 삭제
pub const DELETE_ITEM_COMMENTS: &str = "DELETE FROM comments WHERE item_id = $1";

/// 상품 이미지 삭제
pub const DELETE_ITEM_IMAGES: &str = "DELETE FROM item_images WHERE item_id = $1";

/// 구매 신청 등록 (중복이면 아무것도 반환하지 않음)
pub const INSERT_PURCHASE_REQUEST: &str = r#"
    INSERT INTO purchase_requests (item_id, user_id, created_at)
    VALUES ($1, $2, $3)
    ON CONFLICT (item_id, user_id) DO NOTHING
    RETURNING id, item_id, user_id, created_at
"#;

/// 상품 구매 신청 조회
pub const GET_PURCHASE_REQUESTS: &str = r#"
    SELECT id, item_id, user_id, created_at
    FROM purchase_requests
    WHERE item_id = $1
    ORDER BY id ASC
"#;

/// 구매 신청자 조회
pub const GET_REQUESTING_USERS: &str = r#"
    SELECT users.id
    FROM users
    INNER JOIN purchase_requests ON purchase_requests.user_id = users.id
    WHERE purchase_requests.item_id = $1
    ORDER BY purchase_requests.id ASC
"#;

/// 댓글 등록
pub const INSERT_COMMENT: &str = r#"
    INSERT INTO comments (item_id, user_id, body, created_at)
    VALUES ($1, $2, $3, $4)
    RETURNING id, item_id, user_id, body, created_at
"#;

/// 상품 댓글 조회
pub const GET_COMMENTS: &str = r#"
    SELECT id, item_id, user_id, body, created_at
    FROM comments
    WHERE item_id = $1
    ORDER BY id ASC
"#;

/// 이미지 첨부
pub const INSERT_IMAGE: &str = r#"
    INSERT INTO item_images (item_id, blob_key, filename, content_type, created_at)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, item_id, blob_key, filename, content_type, created_at
"#;

/// 상품 이미지 조회
pub const GET_IMAGES: &str = r#"
    SELECT id, item_id, blob_key, filename, content_type, created_at
    FROM item_images
    WHERE item_id = $1
    ORDER BY id ASC
"#;

/// 이미지 첨부 해제
pub const DELETE_IMAGE: &str = r#"
    DELETE FROM item_images
    WHERE item_id = $1 AND id = $2
    RETURNING id, item_id, blob_key, filename, content_type, created_at
"#;
